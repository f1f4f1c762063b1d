use scribe_gateway::domain::{ArtifactKind, ArtifactLocator, PathSegment, WORD_DOCUMENT_MIME};

fn segment(raw: &str) -> PathSegment {
    PathSegment::parse(raw).unwrap()
}

#[test]
fn given_file_type_aliases_when_parsing_then_kind_is_resolved() {
    assert_eq!(ArtifactKind::from_file_type("txt"), Some(ArtifactKind::PlainText));
    assert_eq!(ArtifactKind::from_file_type("MD"), Some(ArtifactKind::Markdown));
    assert_eq!(ArtifactKind::from_file_type("docx"), Some(ArtifactKind::WordDocument));
    assert_eq!(ArtifactKind::from_file_type("pdf"), None);
}

#[test]
fn given_word_kind_when_reading_content_type_then_office_mime_is_used() {
    assert_eq!(ArtifactKind::WordDocument.content_type(), WORD_DOCUMENT_MIME);
    assert_eq!(ArtifactKind::PlainText.content_type(), "text/plain");
}

#[test]
fn given_traversal_or_header_breaking_input_when_parsing_segment_then_rejected() {
    for raw in ["", " ", "..", ".", "a/b", "a\\b", "x\"y", "%2e%2e", "a?b", "a;b", " lead"] {
        assert!(PathSegment::parse(raw).is_err(), "accepted {:?}", raw);
    }
    assert!(PathSegment::parse("Minutes 2024-05-01.docx").is_ok());
}

#[test]
fn given_job_locator_when_building_paths_then_backend_path_and_attachment_match() {
    let locator = ArtifactLocator::ByJob {
        kind: ArtifactKind::WordDocument,
        job_id: segment("42"),
    };

    assert_eq!(locator.backend_path(), "/download/docx/42");
    assert_eq!(locator.attachment_name(), "42.docx");
    assert_eq!(
        locator.content_disposition(),
        "attachment; filename=\"42.docx\""
    );
    assert!(!locator.requires_admin());
}

#[test]
fn given_user_text_locator_when_building_path_then_user_files_prefix_is_used() {
    let locator = ArtifactLocator::UserText {
        user: segment("alice"),
        job_id: segment("42"),
        filename: segment("interview.txt"),
    };

    assert_eq!(
        locator.backend_path(),
        "/download/user-files/txt/alice/42/interview.txt"
    );
    assert_eq!(locator.kind(), ArtifactKind::PlainText);
}

#[test]
fn given_admin_word_locator_when_checking_access_then_admin_is_required() {
    let locator = ArtifactLocator::AdminWord {
        user: segment("alice"),
        filename: segment("interview.docx"),
    };

    assert!(locator.requires_admin());
    assert_eq!(
        locator.backend_path(),
        "/admin/download/word/alice/interview.docx"
    );
}
