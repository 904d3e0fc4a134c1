use serde::de::value::StrDeserializer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Status of one evidence version.
///
/// The backend reports freshly uploaded evidence as either `pending` or
/// `uploaded`; both mean "awaiting review".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStatus {
    #[default]
    Draft,
    #[serde(alias = "uploaded")]
    Pending,
    Approved,
    Rejected,
}

/// Status of one knowledge document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Reviewed,
    Approved,
    Rejected,
}

/// A reviewer's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Value sent as `approval_status`.
    pub fn wire_status(&self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }
}

/// Transition table and review rules shared by evidence and documents.
pub trait Lifecycle: Copy + PartialEq + fmt::Display + Sized + 'static {
    /// Minimum trimmed length of a review comment.
    const MIN_COMMENT_LEN: usize;

    fn transitions() -> &'static [(Self, Self)];

    /// Status reached by a reviewer decision.
    fn decided(decision: Decision) -> Self;

    fn can_transition(self, to: Self) -> bool {
        Self::transitions().contains(&(self, to))
    }

    /// No outgoing transitions.
    fn is_terminal(self) -> bool {
        !Self::transitions().iter().any(|(from, _)| *from == self)
    }

    /// Whether a reviewer may decide on an item in this status.
    fn awaits_review(self) -> bool {
        self.can_transition(Self::decided(Decision::Approve))
    }

    fn is_approved(self) -> bool {
        self == Self::decided(Decision::Approve)
    }
}

const EVIDENCE_TRANSITIONS: &[(EvidenceStatus, EvidenceStatus)] = &[
    (EvidenceStatus::Draft, EvidenceStatus::Pending),
    (EvidenceStatus::Pending, EvidenceStatus::Approved),
    (EvidenceStatus::Pending, EvidenceStatus::Rejected),
];

const DOCUMENT_TRANSITIONS: &[(DocumentStatus, DocumentStatus)] = &[
    (DocumentStatus::Draft, DocumentStatus::Reviewed),
    (DocumentStatus::Reviewed, DocumentStatus::Approved),
    (DocumentStatus::Reviewed, DocumentStatus::Rejected),
];

impl Lifecycle for EvidenceStatus {
    const MIN_COMMENT_LEN: usize = 10;

    fn transitions() -> &'static [(Self, Self)] {
        EVIDENCE_TRANSITIONS
    }

    fn decided(decision: Decision) -> Self {
        match decision {
            Decision::Approve => EvidenceStatus::Approved,
            Decision::Reject => EvidenceStatus::Rejected,
        }
    }
}

impl Lifecycle for DocumentStatus {
    const MIN_COMMENT_LEN: usize = 5;

    fn transitions() -> &'static [(Self, Self)] {
        DOCUMENT_TRANSITIONS
    }

    fn decided(decision: Decision) -> Self {
        match decision {
            Decision::Approve => DocumentStatus::Approved,
            Decision::Reject => DocumentStatus::Rejected,
        }
    }
}

impl fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceStatus::Draft => write!(f, "draft"),
            EvidenceStatus::Pending => write!(f, "pending"),
            EvidenceStatus::Approved => write!(f, "approved"),
            EvidenceStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Draft => write!(f, "draft"),
            DocumentStatus::Reviewed => write!(f, "reviewed"),
            DocumentStatus::Approved => write!(f, "approved"),
            DocumentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// For status fields: `null`, `""` and a missing key all mean the default
/// (draft) status.
pub fn status_or_default<'de, D, S>(deserializer: D) -> Result<S, D::Error>
where
    D: Deserializer<'de>,
    S: DeserializeOwned + Default,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(S::default()),
        Some(value) => S::deserialize(StrDeserializer::<D::Error>::new(value)),
    }
}
