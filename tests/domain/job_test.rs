use scribe_gateway::domain::{Job, JobRecord, JobStatus, SourceDescriptor};

fn completed_record_json() -> &'static str {
    r#"{
        "id": 42,
        "user_id": 7,
        "created_at": "2024-05-01T10:00:00Z",
        "status": "completed",
        "file_name": "interview.m4a",
        "txt_path": "alice/42/interview.txt",
        "md_path": "alice/42/interview.md",
        "document_path": "alice/interview.docx",
        "document_link": "https://docs.example.com/d/42",
        "error_message": null
    }"#
}

#[test]
fn given_completed_record_when_converting_then_artifacts_are_exposed() {
    let record: JobRecord = serde_json::from_str(completed_record_json()).unwrap();
    let job = Job::from_record(record);

    assert_eq!(job.id.as_str(), "42");
    assert_eq!(job.owner_id.as_ref().map(|id| id.as_str()), Some("7"));
    assert!(job.created_at.is_some());
    assert_eq!(
        job.artifacts().word_document.as_deref(),
        Some("alice/interview.docx")
    );
    assert_eq!(
        job.external_artifact_link(),
        Some("https://docs.example.com/d/42")
    );
    assert_eq!(job.failure_detail(), None);
    assert_eq!(
        job.source,
        SourceDescriptor::UploadedFile {
            filename: "interview.m4a".to_string()
        }
    );
}

#[test]
fn given_in_progress_record_with_paths_when_converting_then_artifacts_are_hidden() {
    let record: JobRecord = serde_json::from_str(
        r#"{"id": "9", "status": "proofreading", "txt_path": "bob/9/partial.txt",
            "document_link": "https://docs.example.com/d/9", "error_message": "stale"}"#,
    )
    .unwrap();
    let job = Job::from_record(record);

    assert!(job.artifacts().is_empty());
    assert_eq!(job.external_artifact_link(), None);
    assert_eq!(job.failure_detail(), None);
}

#[test]
fn given_error_record_without_message_when_converting_then_failure_detail_is_present() {
    let record: JobRecord = serde_json::from_str(r#"{"id": 3, "status": "error"}"#).unwrap();
    let job = Job::from_record(record);

    assert!(job.is_terminal());
    assert!(job.artifacts().is_empty());
    assert!(job.failure_detail().is_some_and(|detail| !detail.is_empty()));
}

#[test]
fn given_error_record_with_message_when_converting_then_message_is_kept() {
    let record: JobRecord = serde_json::from_str(
        r#"{"id": 3, "status": "error", "error_message": "Audio could not be decoded"}"#,
    )
    .unwrap();
    assert_eq!(
        Job::from_record(record).failure_detail(),
        Some("Audio could not be decoded")
    );
}

#[test]
fn given_drive_link_record_when_converting_then_source_is_external_link() {
    let record: JobRecord = serde_json::from_str(
        r#"{"id": 5, "status": "submitted", "drive_link": "https://drive.example.com/f/5"}"#,
    )
    .unwrap();
    assert_eq!(
        Job::from_record(record).source,
        SourceDescriptor::ExternalLink {
            url: "https://drive.example.com/f/5".to_string()
        }
    );
}

#[test]
fn given_unknown_status_record_when_converting_then_label_shows_raw_tag() {
    let record: JobRecord =
        serde_json::from_str(r#"{"id": 11, "status": "queued_for_review"}"#).unwrap();
    let job = Job::from_record(record);

    assert_eq!(job.status_label(), "queued_for_review");
    assert!(!job.is_terminal());
}

#[test]
fn given_epoch_timestamp_when_deserializing_then_created_at_is_parsed() {
    let record: JobRecord =
        serde_json::from_str(r#"{"id": 1, "status": "waiting", "created_at": 1714557600}"#)
            .unwrap();
    assert_eq!(
        record.created_at.map(|t| t.to_rfc3339()).as_deref(),
        Some("2024-05-01T10:00:00+00:00")
    );
}
