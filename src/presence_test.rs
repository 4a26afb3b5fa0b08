use super::*;
use serde_json::json;

fn joined(user_id: &str) -> Event {
    Event::UserJoined {
        user: PresenceEntry::new(user_id),
    }
}

fn list_of(ids: &[&str]) -> PresenceList {
    let mut list = PresenceList::new();
    list.replace(ids.iter().map(|id| PresenceEntry::new(*id)).collect());
    list
}

fn ids(list: &PresenceList) -> Vec<&str> {
    list.entries().iter().map(|entry| entry.user_id.as_str()).collect()
}

#[test]
fn repeated_joins_keep_one_entry_per_id() {
    let mut list = PresenceList::new();
    for id in ["a", "b", "a", "c", "b", "a"] {
        list.apply(&joined(id));
    }
    assert_eq!(ids(&list), vec!["a", "b", "c"]);
}

#[test]
fn duplicate_join_is_a_noop() {
    let mut list = PresenceList::new();
    assert!(list.apply(&joined("a")));
    let before = list.clone();
    assert!(!list.apply(&Event::UserJoined {
        user: PresenceEntry::new("a").with_display_name("Different"),
    }));
    assert_eq!(list, before);
}

#[test]
fn leave_for_absent_user_is_a_noop() {
    let mut list = list_of(&["a", "b"]);
    let before = list.clone();
    assert!(!list.apply(&Event::UserLeft {
        user_id: "zzz".to_owned()
    }));
    assert_eq!(list, before);
}

#[test]
fn leave_removes_matching_entry() {
    let mut list = list_of(&["a", "b", "c"]);
    assert!(list.apply(&Event::UserLeft { user_id: "b".to_owned() }));
    assert_eq!(ids(&list), vec!["a", "c"]);
}

#[test]
fn snapshot_fully_replaces_prior_state() {
    let mut list = list_of(&["a", "b", "c"]);
    list.apply(&Event::RoomPresence {
        users: vec![PresenceEntry::new("d")],
    });
    assert_eq!(list.len(), 1);
    assert_eq!(ids(&list), vec!["d"]);
}

#[test]
fn snapshot_drops_duplicate_ids() {
    let mut list = PresenceList::new();
    list.apply(&Event::RoomPresence {
        users: vec![
            PresenceEntry::new("a").with_display_name("first"),
            PresenceEntry::new("b"),
            PresenceEntry::new("a").with_display_name("second"),
        ],
    });
    assert_eq!(ids(&list), vec!["a", "b"]);
    assert_eq!(list.get("a").and_then(|e| e.display_name.as_deref()), Some("first"));
}

#[test]
fn identical_snapshot_reports_no_change() {
    let mut list = list_of(&["a", "b"]);
    assert!(!list.replace(vec![PresenceEntry::new("a"), PresenceEntry::new("b")]));
}

#[test]
fn typing_updates_present_user_only() {
    let mut list = list_of(&["a"]);
    assert!(list.apply(&Event::UserTyping {
        user_id: "a".to_owned(),
        is_typing: true
    }));
    assert!(list.get("a").is_some_and(|e| e.is_typing));

    assert!(!list.apply(&Event::UserTyping {
        user_id: "ghost".to_owned(),
        is_typing: true
    }));
    assert!(!list.contains("ghost"));
    assert_eq!(list.len(), 1);
}

#[test]
fn typing_with_same_value_reports_no_change() {
    let mut list = list_of(&["a"]);
    assert!(!list.set_typing("a", false));
}

#[test]
fn cursor_updates_present_user_only() {
    let mut list = list_of(&["a"]);
    assert!(list.apply(&Event::UserCursor {
        user_id: "a".to_owned(),
        position: json!({"page": 2, "offset": 14})
    }));
    assert_eq!(
        list.get("a").and_then(|e| e.cursor.clone()),
        Some(json!({"page": 2, "offset": 14}))
    );
    assert!(!list.set_cursor("a", json!({"page": 2, "offset": 14})));
    assert!(!list.set_cursor("ghost", json!(1)));
    assert!(!list.contains("ghost"));
}

#[test]
fn clear_empties_list() {
    let mut list = list_of(&["a", "b"]);
    assert!(list.clear());
    assert!(list.is_empty());
    assert!(!list.clear());
}
