//! Room membership tracker.
//!
//! SYSTEM CONTEXT
//! ==============
//! `PresenceList` is the local projection of who is in the joined room. It is
//! mutated only by inbound [`Event`]s, applied in arrival order, and never
//! holds two entries with the same `user_id`. Entries keep join order.

use frames::{Event, PresenceEntry};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PresenceList {
    entries: Vec<PresenceEntry>,
}

impl PresenceList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound event. Returns `true` if the list changed.
    pub fn apply(&mut self, event: &Event) -> bool {
        match event {
            Event::RoomPresence { users } => self.replace(users.clone()),
            Event::UserJoined { user } => self.join(user.clone()),
            Event::UserLeft { user_id } => self.leave(user_id),
            Event::UserTyping { user_id, is_typing } => self.set_typing(user_id, *is_typing),
            Event::UserCursor { user_id, position } => self.set_cursor(user_id, position.clone()),
        }
    }

    /// Replace the whole list with a server snapshot.
    ///
    /// Repeated ids inside the snapshot keep their first occurrence.
    pub fn replace(&mut self, users: Vec<PresenceEntry>) -> bool {
        let mut next: Vec<PresenceEntry> = Vec::with_capacity(users.len());
        for user in users {
            if !next.iter().any(|entry| entry.user_id == user.user_id) {
                next.push(user);
            }
        }
        if next == self.entries {
            return false;
        }
        self.entries = next;
        true
    }

    /// Append a user unless one with the same id is already present.
    pub fn join(&mut self, user: PresenceEntry) -> bool {
        if self.contains(&user.user_id) {
            return false;
        }
        self.entries.push(user);
        true
    }

    pub fn leave(&mut self, user_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.user_id != user_id);
        self.entries.len() != before
    }

    /// Update the typing flag of a present user. Absent users are not created.
    pub fn set_typing(&mut self, user_id: &str, is_typing: bool) -> bool {
        let Some(entry) = self.get_mut(user_id) else {
            return false;
        };
        if entry.is_typing == is_typing {
            return false;
        }
        entry.is_typing = is_typing;
        true
    }

    pub fn set_cursor(&mut self, user_id: &str, position: Value) -> bool {
        let Some(entry) = self.get_mut(user_id) else {
            return false;
        };
        if entry.cursor.as_ref() == Some(&position) {
            return false;
        }
        entry.cursor = Some(position);
        true
    }

    pub fn clear(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        true
    }

    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<&PresenceEntry> {
        self.entries.iter().find(|entry| entry.user_id == user_id)
    }

    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.get(user_id).is_some()
    }

    #[must_use]
    pub fn entries(&self) -> &[PresenceEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_mut(&mut self, user_id: &str) -> Option<&mut PresenceEntry> {
        self.entries.iter_mut().find(|entry| entry.user_id == user_id)
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;
