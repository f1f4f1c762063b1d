use scribe_gateway::domain::{PromptFamily, PromptRecord, VersionedPrompt};

#[test]
fn given_each_family_when_building_paths_then_family_slug_is_embedded() {
    assert_eq!(
        PromptFamily::Transcribe.collection_path(),
        "/admin/transcribe-prompts"
    );
    assert_eq!(
        PromptFamily::Proofread.active_setting_path(),
        "/admin/settings/active-proofread-prompt"
    );
    assert_eq!(PromptFamily::System.id_field(), "system_prompt_id");
}

#[test]
fn given_slug_when_parsing_family_then_all_families_round_trip() {
    for family in PromptFamily::ALL {
        assert_eq!(PromptFamily::from_slug(family.as_str()), Some(family));
    }
    assert_eq!(PromptFamily::from_slug("summary"), None);
}

#[test]
fn given_backend_record_when_converting_then_versioned_prompt_carries_family() {
    let record: PromptRecord = serde_json::from_str(
        r#"{"id": 4, "version": "v2", "prompt": "Fix punctuation.", "is_active": true,
            "created_at": "2024-05-01 10:00:00"}"#,
    )
    .unwrap();

    let prompt = VersionedPrompt::from_record(PromptFamily::Proofread, record);

    assert_eq!(prompt.id.as_str(), "4");
    assert_eq!(prompt.family, PromptFamily::Proofread);
    assert_eq!(prompt.body, "Fix punctuation.");
    assert!(prompt.is_active);
    assert!(prompt.created_at.is_some());
}
