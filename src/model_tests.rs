//! Tests for the core data model

use super::*;

#[test]
fn entity_key_lowercases_both_parts() {
    assert_eq!(entity_key("Dreamscythe", "Thrall"), "dreamscythe-thrall");
    assert_eq!(entity_key("dreamscythe", "thrall"), "dreamscythe-thrall");
}

#[test]
fn new_entity_normalizes_and_copies_snapshot() {
    let snapshot = Snapshot {
        level: 20,
        attributes: CharacterAttributes {
            race: Some("Orc".to_string()),
            character_class: Some("Shaman".to_string()),
            item_level: None,
            gender: None,
        },
    };

    let entity = TrackedEntity::new(
        "Dreamscythe",
        "Thrall",
        &snapshot,
        "https://example.com/hook".to_string(),
    );

    assert_eq!(entity.key, "dreamscythe-thrall");
    assert_eq!(entity.server, "dreamscythe");
    assert_eq!(entity.name, "thrall");
    assert_eq!(entity.last_level, 20);
    assert_eq!(entity.attributes, snapshot.attributes);
    assert_eq!(entity.notify_target, "https://example.com/hook");
    assert!(entity.last_checked_at.is_some());
}

// ── persisted-layout compatibility ───────────────────────────────────

#[test]
fn entity_deserializes_without_optional_fields() {
    // Layout written before attributes/last_checked_at existed.
    let json = r#"{
        "key": "dreamscythe-thrall",
        "server": "dreamscythe",
        "name": "thrall",
        "last_level": 28,
        "notify_target": "https://example.com/hook"
    }"#;

    let entity: TrackedEntity = serde_json::from_str(json).unwrap();
    assert_eq!(entity.last_level, 28);
    assert_eq!(entity.attributes, CharacterAttributes::default());
    assert!(entity.last_checked_at.is_none());
}

#[test]
fn entity_deserializes_with_unknown_fields() {
    // Fields added by a future version must not break loading.
    let json = r#"{
        "key": "dreamscythe-thrall",
        "server": "dreamscythe",
        "name": "thrall",
        "last_level": 28,
        "notify_target": "https://example.com/hook",
        "guild": "The Horde",
        "attributes": {"race": "Orc", "class": "Shaman", "talent_spec": "Enhancement"}
    }"#;

    let entity: TrackedEntity = serde_json::from_str(json).unwrap();
    assert_eq!(entity.attributes.race.as_deref(), Some("Orc"));
    assert_eq!(entity.attributes.character_class.as_deref(), Some("Shaman"));
}

#[test]
fn attributes_serialize_class_under_renamed_key() {
    let attrs = CharacterAttributes {
        race: Some("Tauren".to_string()),
        character_class: Some("Druid".to_string()),
        item_level: Some(41),
        gender: Some("Female".to_string()),
    };

    let json = serde_json::to_value(&attrs).unwrap();
    assert_eq!(json["class"], "Druid");
    assert_eq!(json["race"], "Tauren");
    assert_eq!(json["item_level"], 41);
}

#[test]
fn attributes_skip_absent_fields_when_serializing() {
    let json = serde_json::to_string(&CharacterAttributes::default()).unwrap();
    assert_eq!(json, "{}");
}
