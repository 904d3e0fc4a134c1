//! Services Module
//!
//! One method per user action. Each checks permissions and input locally,
//! then talks to the backend with sequential awaits.

mod evidence;
mod inventory;
mod knowledge;

pub use evidence::{EvidenceBoard, EvidencePage, EvidenceQuery, EvidenceService, NewEvidence};
pub use inventory::InventoryService;
pub use knowledge::{CollectionDraft, KnowledgeService, NewDocument};
