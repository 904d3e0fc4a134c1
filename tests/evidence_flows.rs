mod common;

use serde_json::json;

use common::*;
use evidence_console::api::Method;
use evidence_console::error::ConsoleError;
use evidence_console::evidence::{EvidenceGroup, EvidenceVersion};
use evidence_console::lifecycle::{Capability, Decision, EvidenceStatus};
use evidence_console::notify::{run_action, NoticeLevel};
use evidence_console::services::{EvidenceBoard, EvidenceQuery, EvidenceService, NewEvidence};

fn new_evidence() -> NewEvidence {
    NewEvidence {
        name: "Access Review Q3".to_string(),
        control_id: "CC6.1".to_string(),
        description: "Quarterly access review".to_string(),
        is_sensitive: false,
        recurrence: None,
        collected_by: "ana".to_string(),
    }
}

fn pending(doc_id: &str) -> EvidenceVersion {
    let mut v = EvidenceVersion::new(doc_id, "1.0.0", vec!["report.pdf".to_string()]);
    v.status = EvidenceStatus::Pending;
    v
}

fn group(file_names: &[&str]) -> EvidenceGroup {
    let latest = EvidenceVersion::new("ev-1", "1.0.0", file_names.iter().map(|s| s.to_string()).collect());
    EvidenceGroup::from_first("Access Review Q3", "CC6.1", latest)
}

#[tokio::test]
async fn test_create_registers_uploads_then_confirms() {
    let backend = ScriptedBackend::new(vec![ticket("ev-9", 2), ok(json!({}))]);
    let store = std::sync::Arc::new(RecordingStore::default());
    let service = EvidenceService::new(backend.clone(), store.clone());

    let doc_id = service
        .create(&reviewer(), &new_evidence(), &files(&["a.pdf", "b.pdf"]))
        .await
        .unwrap();
    assert_eq!(doc_id, "ev-9");

    let requests = backend.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path, "evidence");
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["files"][1]["file_name"], "b.pdf");
    assert_eq!(requests[1].path, "evidence/confirm-upload?doc_id=ev-9&control_id=CC6.1");

    let puts = store.puts().await;
    assert_eq!(puts[0], ("https://blob.example/ev-9/0".to_string(), "a.pdf".to_string()));
    assert_eq!(puts[1].1, "b.pdf");
}

#[tokio::test]
async fn test_failed_blob_put_never_confirms() {
    let backend = ScriptedBackend::new(vec![ticket("ev-9", 3), ok(json!({}))]);
    let store = RecordingStore::failing_on("b.pdf");
    let service = EvidenceService::new(backend.clone(), store.clone());

    let err = service
        .create(&reviewer(), &new_evidence(), &files(&["a.pdf", "b.pdf", "c.pdf"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ConsoleError::UploadAborted { ref file, index: 1, .. } if file == "b.pdf"));
    assert_eq!(store.puts().await.len(), 2);
    assert_eq!(backend.paths().await, vec!["evidence"]);
}

#[tokio::test]
async fn test_viewer_cannot_create_and_nothing_is_sent() {
    let backend = ScriptedBackend::new(vec![]);
    let store = std::sync::Arc::new(RecordingStore::default());
    let service = EvidenceService::new(backend.clone(), store.clone());

    let err = service.create(&viewer(), &new_evidence(), &files(&["a.pdf"])).await.unwrap_err();
    assert!(err.is_permission_denied());
    assert!(backend.requests().await.is_empty());
    assert!(store.puts().await.is_empty());
}

#[tokio::test]
async fn test_create_without_files_is_a_field_error() {
    let backend = ScriptedBackend::new(vec![]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let err = service.create(&reviewer(), &new_evidence(), &[]).await.unwrap_err();
    assert_eq!(err, ConsoleError::validation("files", "At least one file is required"));
    assert!(backend.requests().await.is_empty());
}

#[tokio::test]
async fn test_decide_sends_approval_payload() {
    let backend = ScriptedBackend::new(vec![ok(json!({}))]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let status = service
        .decide(&reviewer(), &pending("ev-3"), "CC6.1", Decision::Reject, "  Missing signatures  ")
        .await
        .unwrap();
    assert_eq!(status, EvidenceStatus::Rejected);

    let requests = backend.requests().await;
    assert_eq!(requests[0].path, "evidence/approve-evidence");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "doc_id": "ev-3",
            "control_id": "CC6.1",
            "approval_status": "rejected",
            "comments": "Missing signatures",
        }))
    );
}

#[tokio::test]
async fn test_decide_guards_send_nothing() {
    let backend = ScriptedBackend::new(vec![]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    // no update grant
    let err = service
        .decide(&viewer(), &pending("ev-3"), "CC6.1", Decision::Approve, "Looks complete")
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    // comment under ten characters
    let err = service
        .decide(&reviewer(), &pending("ev-3"), "CC6.1", Decision::Approve, "ok       ")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "comments"));

    // already decided
    let mut approved = pending("ev-3");
    approved.status = EvidenceStatus::Approved;
    let err = service
        .decide(&reviewer(), &approved, "CC6.1", Decision::Reject, "Changed my mind here")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidTransition { .. }));

    assert!(backend.requests().await.is_empty());
}

#[tokio::test]
async fn test_new_version_with_same_files_is_a_patch() {
    let backend = ScriptedBackend::new(vec![ticket("ev-2", 1), ok(json!({}))]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let group = group(&["Report.PDF"]);

    service
        .create_version(&reviewer(), &group, &group.open_version_draft(), "", &files(&["report.pdf"]))
        .await
        .unwrap();

    let body = backend.requests().await[0].body.clone().unwrap();
    assert_eq!(body["version"], "1.0.1");
    assert_eq!(body["parent_id"], "ev-1");
    assert_eq!(backend.paths().await[1], "evidence/confirm-upload?doc_id=ev-2&control_id=CC6.1");
}

#[tokio::test]
async fn test_new_version_with_changed_files_is_major() {
    let backend = ScriptedBackend::new(vec![ticket("ev-2", 2), ok(json!({}))]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let group = group(&["report.pdf"]);

    service
        .create_version(&reviewer(), &group, &group.open_version_draft(), "", &files(&["report.pdf", "annex.pdf"]))
        .await
        .unwrap();

    assert_eq!(backend.requests().await[0].body.as_ref().unwrap()["version"], "2.0.0");
}

#[tokio::test]
async fn test_manual_override_wins() {
    let backend = ScriptedBackend::new(vec![ticket("ev-2", 1), ok(json!({}))]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let group = group(&["report.pdf"]);

    let mut draft = group.open_version_draft();
    draft.override_version("3.1.4").unwrap();
    service
        .create_version(&reviewer(), &group, &draft, "", &files(&["report.pdf"]))
        .await
        .unwrap();

    assert_eq!(backend.requests().await[0].body.as_ref().unwrap()["version"], "3.1.4");
}

#[tokio::test]
async fn test_board_keeps_page_when_refresh_fails() {
    let first = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "pending")])]);
    let backend = ScriptedBackend::new(vec![
        ok(first),
        status(500, json!({"detail": "database unavailable"})),
    ]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let mut board = EvidenceBoard::new(service, EvidenceQuery::default());

    board.refresh().await.unwrap();
    let before = board.page().cloned();

    let err = board.search(Some("vendor".to_string())).await.unwrap_err();
    assert_eq!(err.user_message(), "database unavailable");
    assert_eq!(board.page().cloned(), before);
    assert_eq!(board.query().keywords, None);

    let paths = backend.paths().await;
    assert_eq!(paths[0], "evidences?page=1&limit=10&group_by_name=true");
    assert_eq!(paths[1], "evidences?page=1&limit=10&group_by_name=true&keywords=vendor");
}

#[tokio::test]
async fn test_board_refetches_after_decision() {
    let pending_page = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "uploaded")])]);
    let approved_page = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "approved")])]);
    let backend = ScriptedBackend::new(vec![ok(pending_page), ok(json!({})), ok(approved_page)]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let mut board = EvidenceBoard::new(service, EvidenceQuery::default());

    board.refresh().await.unwrap();
    let latest = board.group("Access Review Q3").and_then(|g| g.latest()).cloned().unwrap();
    assert_eq!(latest.status, EvidenceStatus::Pending);

    board
        .decide(&reviewer(), &latest, "CC6.1", Decision::Approve, "All controls evidenced")
        .await
        .unwrap();

    let refreshed = board.group("Access Review Q3").and_then(|g| g.latest()).unwrap();
    assert_eq!(refreshed.status, EvidenceStatus::Approved);
    assert_eq!(backend.requests().await.len(), 3);
}

#[tokio::test]
async fn test_action_boundary_turns_denial_into_warning() {
    let backend = ScriptedBackend::new(vec![]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let outcome = run_action(
        "evidence.decide",
        "Decision recorded",
        service.decide(&viewer(), &pending("ev-3"), "CC6.1", Decision::Approve, "Looks complete"),
    )
    .await;
    assert!(!outcome.succeeded());
    assert_eq!(outcome.notice.level, NoticeLevel::Warning);
    assert_eq!(outcome.notice.message, "You do not have permission to update evidence");
}

#[tokio::test]
async fn test_viewer_cannot_create_version() {
    let backend = ScriptedBackend::new(vec![]);
    let store = std::sync::Arc::new(RecordingStore::default());
    let service = EvidenceService::new(backend.clone(), store.clone());
    let group = group(&["report.pdf"]);

    let err = service
        .create_version(&viewer(), &group, &group.open_version_draft(), "", &files(&["report.pdf"]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ConsoleError::PermissionDenied { bucket: "evidence".to_string(), capability: Capability::Create }
    );
    assert!(backend.requests().await.is_empty());
    assert!(store.puts().await.is_empty());
}

#[tokio::test]
async fn test_list_tolerates_legacy_rows() {
    let mut legacy = group_json("Legacy Policy", &[("ev-2", "abc", "Policy.pdf", "approved")]);
    legacy["versions"][0]["status"] = json!(null);
    let page = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "pending")]), legacy]);
    let backend = ScriptedBackend::new(vec![ok(page)]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let page = service.list(&EvidenceQuery::default()).await.unwrap();
    assert_eq!(page.items.len(), 2);

    let legacy = &page.items[1];
    let latest = legacy.latest().unwrap();
    assert_eq!(latest.version, "abc");
    assert_eq!(latest.status, EvidenceStatus::Draft);

    let mut draft = legacy.open_version_draft();
    draft.select_files(&["Policy.pdf"]);
    assert_eq!(draft.version(), Some("1.0.0"));
}

#[tokio::test]
async fn test_board_reports_upload_when_refresh_fails() {
    let backend = ScriptedBackend::new(vec![
        ticket("ev-9", 1),
        ok(json!({})),
        status(500, json!({"detail": "list down"})),
    ]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let mut board = EvidenceBoard::new(service, EvidenceQuery::default());

    let doc_id = board.upload(&reviewer(), &new_evidence(), &files(&["a.pdf"])).await.unwrap();
    assert_eq!(doc_id, "ev-9");
    assert!(board.page().is_none());
    assert_eq!(backend.requests().await.len(), 3);
}

#[tokio::test]
async fn test_board_reports_decision_when_refresh_fails() {
    let first = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "pending")])]);
    let backend = ScriptedBackend::new(vec![
        ok(first),
        ok(json!({})),
        status(503, json!({"detail": "list down"})),
    ]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));
    let mut board = EvidenceBoard::new(service, EvidenceQuery::default());

    board.refresh().await.unwrap();
    let before = board.page().cloned();
    let latest = board.group("Access Review Q3").and_then(|g| g.latest()).cloned().unwrap();

    let status = board
        .decide(&reviewer(), &latest, "CC6.1", Decision::Reject, "Wrong reporting period")
        .await
        .unwrap();
    assert_eq!(status, EvidenceStatus::Rejected);
    assert_eq!(board.page().cloned(), before);
}

#[tokio::test]
async fn test_decide_by_id_uses_stored_status() {
    let page = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "approved")])]);
    let backend = ScriptedBackend::new(vec![ok(page)]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let err = service
        .decide_by_id(&reviewer(), "CC6.1", "ev-1", Decision::Reject, "Reopening this review")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidTransition { .. }));
    assert_eq!(backend.paths().await, vec!["evidences?page=1&limit=100&control_id=CC6.1&group_by_name=true"]);
}

#[tokio::test]
async fn test_decide_by_id_pages_until_found() {
    let mut first = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "approved")])]);
    first["total"] = json!(2);
    let mut second = page_json(vec![group_json("Vendor Review", &[("ev-7", "2.0.0", "vendors.pdf", "uploaded")])]);
    second["total"] = json!(2);
    second["page"] = json!(2);
    let backend = ScriptedBackend::new(vec![ok(first), ok(second), ok(json!({}))]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let status = service
        .decide_by_id(&reviewer(), "CC6.1", "ev-7", Decision::Approve, "Vendor list verified")
        .await
        .unwrap();
    assert_eq!(status, EvidenceStatus::Approved);

    let requests = backend.requests().await;
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].path, "evidences?page=2&limit=100&control_id=CC6.1&group_by_name=true");
    assert_eq!(requests[2].body.as_ref().unwrap()["doc_id"], "ev-7");
}

#[tokio::test]
async fn test_decide_by_id_unknown_doc_is_a_field_error() {
    let page = page_json(vec![group_json("Access Review Q3", &[("ev-1", "1.0.0", "report.pdf", "pending")])]);
    let backend = ScriptedBackend::new(vec![ok(page)]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let err = service
        .decide_by_id(&reviewer(), "CC6.1", "ev-404", Decision::Approve, "Looks complete")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "doc_id"));
    assert_eq!(backend.requests().await.len(), 1);
}

#[tokio::test]
async fn test_decide_by_id_checks_before_lookup() {
    let backend = ScriptedBackend::new(vec![]);
    let service = EvidenceService::new(backend.clone(), std::sync::Arc::new(RecordingStore::default()));

    let denied = service
        .decide_by_id(&viewer(), "CC6.1", "ev-1", Decision::Approve, "Looks complete")
        .await
        .unwrap_err();
    assert!(denied.is_permission_denied());

    let short = service
        .decide_by_id(&reviewer(), "CC6.1", "ev-1", Decision::Reject, "no")
        .await
        .unwrap_err();
    assert!(matches!(short, ConsoleError::Validation { ref field, .. } if field == "comments"));
    assert!(backend.requests().await.is_empty());
}
