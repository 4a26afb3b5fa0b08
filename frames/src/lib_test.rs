use super::*;
use serde_json::json;

fn encoded(outbound: &Outbound) -> Value {
    let text = encode_outbound(outbound).expect("encode should succeed");
    serde_json::from_str(&text).expect("encoded frame should be json")
}

#[test]
fn decode_room_presence_fills_defaults() {
    let text = r#"{"type":"room_presence","users":[{"user_id":"u1"},{"user_id":"u2","display_name":"Bo","is_typing":true}]}"#;
    let Inbound::Event(Event::RoomPresence { users }) = decode_event(text).expect("decode") else {
        panic!("expected room_presence");
    };
    assert_eq!(users.len(), 2);
    assert_eq!(users[0], PresenceEntry::new("u1"));
    assert_eq!(users[1].display_name.as_deref(), Some("Bo"));
    assert!(users[1].is_typing);
    assert!(users[1].cursor.is_none());
}

#[test]
fn decode_user_events() {
    assert_eq!(
        decode_event(r#"{"type":"user_joined","user":{"user_id":"u3"}}"#).expect("decode"),
        Inbound::Event(Event::UserJoined { user: PresenceEntry::new("u3") })
    );
    assert_eq!(
        decode_event(r#"{"type":"user_left","user_id":"u3"}"#).expect("decode"),
        Inbound::Event(Event::UserLeft { user_id: "u3".to_owned() })
    );
    assert_eq!(
        decode_event(r#"{"type":"user_typing","user_id":"u3","is_typing":false}"#).expect("decode"),
        Inbound::Event(Event::UserTyping {
            user_id: "u3".to_owned(),
            is_typing: false
        })
    );
    assert_eq!(
        decode_event(r#"{"type":"user_cursor","user_id":"u3","position":{"line":4}}"#).expect("decode"),
        Inbound::Event(Event::UserCursor {
            user_id: "u3".to_owned(),
            position: json!({"line": 4})
        })
    );
}

#[test]
fn decode_unknown_type_is_not_an_error() {
    let inbound = decode_event(r#"{"type":"document_locked","doc":"d1"}"#).expect("decode");
    assert_eq!(inbound, Inbound::Unknown("document_locked".to_owned()));
}

#[test]
fn decode_rejects_non_json() {
    let err = decode_event("hello there").expect_err("text should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_rejects_missing_type() {
    let err = decode_event(r#"{"users":[]}"#).expect_err("missing type should fail");
    assert!(matches!(err, CodecError::MissingType));

    let err = decode_event(r#"{"type":7}"#).expect_err("numeric type should fail");
    assert!(matches!(err, CodecError::MissingType));
}

#[test]
fn decode_rejects_known_type_with_bad_fields() {
    let err = decode_event(r#"{"type":"user_left"}"#).expect_err("missing user_id should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn event_kind_matches_known_types() {
    let events = [
        Event::RoomPresence { users: Vec::new() },
        Event::UserJoined { user: PresenceEntry::new("u") },
        Event::UserLeft { user_id: "u".to_owned() },
        Event::UserTyping {
            user_id: "u".to_owned(),
            is_typing: true,
        },
        Event::UserCursor {
            user_id: "u".to_owned(),
            position: Value::Null,
        },
    ];
    for event in &events {
        assert!(Event::is_known(event.kind()), "{} should be known", event.kind());
    }
}

#[test]
fn encode_commands_use_wire_shapes() {
    assert_eq!(encoded(&Outbound::join("r1")), json!({"type":"join_room","room_id":"r1"}));
    assert_eq!(encoded(&Outbound::leave("r1")), json!({"type":"leave_room","room_id":"r1"}));
    assert_eq!(
        encoded(&Outbound::typing("r1", true)),
        json!({"type":"typing","room_id":"r1","is_typing":true})
    );
    assert_eq!(
        encoded(&Outbound::cursor("r1", json!({"x": 3, "y": 9}))),
        json!({"type":"cursor","room_id":"r1","position":{"x":3,"y":9}})
    );
}

#[test]
fn encode_custom_flattens_payload_and_keeps_type() {
    let mut payload = Map::new();
    payload.insert("room_id".to_owned(), json!("r1"));
    payload.insert("type".to_owned(), json!("spoofed"));
    payload.insert("section".to_owned(), json!(3));

    let value = encoded(&Outbound::custom("section_focus", payload));
    assert_eq!(value, json!({"type":"section_focus","room_id":"r1","section":3}));
}

#[test]
fn outbound_kind_reports_wire_type() {
    assert_eq!(Outbound::join("r").kind(), "join_room");
    assert_eq!(Outbound::custom("ping", Map::new()).kind(), "ping");
}

#[test]
fn presence_entry_omits_empty_optionals() {
    let value = serde_json::to_value(PresenceEntry::new("u1")).expect("serialize");
    assert_eq!(value, json!({"user_id":"u1","is_typing":false}));

    let named = PresenceEntry::new("u1").with_display_name("Ada");
    assert_eq!(named.display_name.as_deref(), Some("Ada"));
}
