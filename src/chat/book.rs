//! The chat collection and its current chat

use super::types::{truncate_title, Chat, ChatMap, Message, NoticeKind, Role};
use crate::error::Result;
use crate::storage::LocalStore;
use chrono::{DateTime, Utc};

/// Store key holding the serialized chat collection
pub const CHATS_KEY: &str = "growth-chats";

/// Title given to a chat before its first user message
pub const DEFAULT_TITLE: &str = "New Chat";

/// Issues identifiers derived from the current time in milliseconds
///
/// Identifiers never repeat and never go backwards: when the clock has not
/// advanced past the last issued value the previous value plus one is used.
#[derive(Debug, Clone, Default)]
pub struct IdClock {
    last: i64,
}

impl IdClock {
    /// Start after the largest numeric identifier already in use
    pub fn seeded_from<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let last = ids
            .into_iter()
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn next_at(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

/// All chats plus the one currently open
///
/// At most one chat is current. After [`ChatBook::ensure_current`] or any
/// delete, exactly one chat is current.
#[derive(Debug, Clone)]
pub struct ChatBook {
    chats: ChatMap,
    current_id: Option<String>,
    clock: IdClock,
    title_max_chars: usize,
}

impl ChatBook {
    pub fn new(chats: ChatMap, title_max_chars: usize) -> Self {
        let mut clock = IdClock::seeded_from(chats.keys().map(String::as_str));
        // Message ids share the clock so they stay unique across chats too.
        for chat in chats.values() {
            let seeded = IdClock::seeded_from(chat.messages.iter().map(|m| m.id.as_str()));
            clock.last = clock.last.max(seeded.last);
        }
        Self {
            chats,
            current_id: None,
            clock,
            title_max_chars,
        }
    }

    /// Load the collection from the store
    ///
    /// A missing or unreadable blob yields an empty collection; the failure
    /// is logged rather than returned.
    pub fn load(store: &LocalStore, title_max_chars: usize) -> Self {
        let chats = match store.get_json::<ChatMap>(CHATS_KEY) {
            Ok(Some(chats)) => chats,
            Ok(None) => ChatMap::new(),
            Err(e) => {
                tracing::error!("Error loading chats: {:#}", e);
                ChatMap::new()
            }
        };
        tracing::debug!(count = chats.len(), "Loaded chats from local store");
        Self::new(chats, title_max_chars)
    }

    /// Write the whole collection to the store as one blob
    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.set_json(CHATS_KEY, &self.chats)
    }

    pub fn chats(&self) -> &ChatMap {
        &self.chats
    }

    pub fn get(&self, id: &str) -> Option<&Chat> {
        self.chats.get(id)
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&Chat> {
        self.current_id.as_ref().and_then(|id| self.chats.get(id))
    }

    fn current_mut(&mut self) -> Option<&mut Chat> {
        let id = self.current_id.as_ref()?;
        self.chats.get_mut(id)
    }

    /// Chats ordered by last update, most recent first
    pub fn history(&self) -> Vec<&Chat> {
        let mut chats: Vec<&Chat> = self.chats.values().collect();
        chats.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| numeric_desc(&a.id, &b.id))
        });
        chats
    }

    /// Make sure a chat is open: the most recent one, or a new one when the
    /// collection is empty
    pub fn ensure_current(&mut self) -> String {
        if let Some(id) = self.current_id.clone() {
            if self.chats.contains_key(&id) {
                return id;
            }
        }
        match self.history().first().map(|c| c.id.clone()) {
            Some(id) => {
                self.current_id = Some(id.clone());
                id
            }
            None => self.create_new_chat(),
        }
    }

    /// Create an empty chat and make it current
    pub fn create_new_chat(&mut self) -> String {
        let now = Utc::now();
        let id = self.clock.next_at(now);
        let chat = Chat {
            id: id.clone(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.chats.insert(id.clone(), chat);
        self.current_id = Some(id.clone());
        tracing::debug!(chat_id = %id, "Created new chat");
        id
    }

    /// Make `id` the current chat; unknown ids leave everything unchanged
    pub fn load_chat(&mut self, id: &str) -> bool {
        if !self.chats.contains_key(id) {
            return false;
        }
        self.current_id = Some(id.to_string());
        true
    }

    /// Delete a chat
    ///
    /// Deleting the current chat opens the most recently updated remaining
    /// chat, or a fresh one when none remain. Unknown ids are a no-op.
    pub fn delete_chat(&mut self, id: &str) -> bool {
        if self.chats.remove(id).is_none() {
            return false;
        }
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
            self.ensure_current();
        }
        tracing::debug!(chat_id = %id, "Deleted chat");
        true
    }

    /// Append a message to the current chat
    ///
    /// The first user message also becomes the chat title. Returns the new
    /// message, or `None` when no chat is current.
    pub fn add_message(&mut self, role: Role, content: &str) -> Option<Message> {
        self.push(role, content, None)
    }

    /// Append a system notice to the current chat
    pub fn add_notice(&mut self, content: &str, kind: NoticeKind) -> Option<Message> {
        self.push(Role::System, content, Some(kind))
    }

    fn push(&mut self, role: Role, content: &str, kind: Option<NoticeKind>) -> Option<Message> {
        let now = Utc::now();
        let id = self.clock.next_at(now);
        let title_max = self.title_max_chars;
        let chat = self.current_mut()?;

        let message = Message {
            id,
            role,
            content: content.to_string(),
            timestamp: now,
            kind,
        };
        chat.messages.push(message.clone());
        chat.updated_at = now;

        if role == Role::User && chat.user_message_count() == 1 {
            chat.title = truncate_title(content, title_max);
        }

        Some(message)
    }

    /// Append text to a message of the current chat
    pub fn append_to_message(&mut self, message_id: &str, text: &str) -> bool {
        self.update_message(message_id, |m| m.content.push_str(text))
    }

    /// Replace the text of a message of the current chat
    pub fn set_message_content(&mut self, message_id: &str, content: &str) -> bool {
        self.update_message(message_id, |m| m.content = content.to_string())
    }

    fn update_message(&mut self, message_id: &str, f: impl FnOnce(&mut Message)) -> bool {
        let Some(chat) = self.current_mut() else {
            return false;
        };
        match chat.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                f(message);
                chat.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Find a message of the current chat
    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.current()?.messages.iter().find(|m| m.id == message_id)
    }

    /// Merge chats fetched from the server over the local ones
    ///
    /// Server entries replace local entries with the same id. The current
    /// chat stays current.
    pub fn merge(&mut self, server_chats: ChatMap) {
        let incoming = server_chats.len();
        for (id, chat) in server_chats {
            let seeded = IdClock::seeded_from(
                std::iter::once(id.as_str()).chain(chat.messages.iter().map(|m| m.id.as_str())),
            );
            self.clock.last = self.clock.last.max(seeded.last);
            self.chats.insert(id, chat);
        }
        tracing::debug!(incoming, total = self.chats.len(), "Merged server chats");
    }

    /// Resolve a chat selector: an exact id, or a 1-based position in
    /// [`ChatBook::history`]
    pub fn resolve(&self, selector: &str) -> Option<String> {
        let selector = selector.trim().trim_start_matches('#');
        if self.chats.contains_key(selector) {
            return Some(selector.to_string());
        }
        let index: usize = selector.parse().ok()?;
        if index == 0 {
            return None;
        }
        self.history().get(index - 1).map(|c| c.id.clone())
    }
}

fn numeric_desc(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x),
        _ => b.cmp(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, sample_map, temp_store};

    fn book() -> ChatBook {
        ChatBook::new(ChatMap::new(), 30)
    }

    #[test]
    fn test_id_clock_is_monotonic() {
        let mut clock = IdClock::default();
        let a = clock.next_at(at(0));
        let b = clock.next_at(at(0));
        let c = clock.next_at(at(-10));
        assert!(b.parse::<i64>().unwrap() > a.parse::<i64>().unwrap());
        assert!(c.parse::<i64>().unwrap() > b.parse::<i64>().unwrap());
    }

    #[test]
    fn test_id_clock_seeded_past_existing_ids() {
        let mut clock = IdClock::seeded_from(["99999999999999", "not-a-number"]);
        assert_eq!(clock.next_at(at(0)), "100000000000000");
    }

    #[test]
    fn test_ensure_current_creates_chat_when_empty() {
        let mut book = book();
        let id = book.ensure_current();
        assert_eq!(book.len(), 1);
        assert_eq!(book.current_id(), Some(id.as_str()));
        assert_eq!(book.current().unwrap().title, DEFAULT_TITLE);
    }

    #[test]
    fn test_ensure_current_picks_most_recent() {
        let mut book = ChatBook::new(sample_map(&[("1", "old", 10), ("2", "new", 20)]), 30);
        assert_eq!(book.ensure_current(), "2");
    }

    #[test]
    fn test_created_ids_are_unique() {
        let mut book = book();
        let a = book.create_new_chat();
        let b = book.create_new_chat();
        assert_ne!(a, b);
        assert_eq!(book.current_id(), Some(b.as_str()));
    }

    #[test]
    fn test_first_user_message_sets_title() {
        let mut book = book();
        book.ensure_current();
        book.add_message(Role::User, "Tell me about compound interest and savings")
            .unwrap();
        book.add_message(Role::User, "second").unwrap();
        assert_eq!(
            book.current().unwrap().title,
            "Tell me about compound interes..."
        );
    }

    #[test]
    fn test_assistant_message_does_not_set_title() {
        let mut book = book();
        book.ensure_current();
        book.add_message(Role::Assistant, "Hello!").unwrap();
        assert_eq!(book.current().unwrap().title, DEFAULT_TITLE);
    }

    #[test]
    fn test_add_message_without_current_chat() {
        let mut book = book();
        assert!(book.add_message(Role::User, "hi").is_none());
        assert!(book.add_notice("hi", NoticeKind::Info).is_none());
    }

    #[test]
    fn test_add_notice_records_kind() {
        let mut book = book();
        book.ensure_current();
        let notice = book.add_notice("Saved", NoticeKind::Success).unwrap();
        assert_eq!(notice.role, Role::System);
        assert_eq!(notice.kind, Some(NoticeKind::Success));
        assert_eq!(book.current().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_load_unknown_chat_is_noop() {
        let mut book = ChatBook::new(sample_map(&[("1", "a", 10)]), 30);
        book.ensure_current();
        assert!(!book.load_chat("missing"));
        assert_eq!(book.current_id(), Some("1"));
    }

    #[test]
    fn test_delete_current_loads_most_recent_remaining() {
        let mut book = ChatBook::new(
            sample_map(&[("1", "a", 10), ("2", "b", 30), ("3", "c", 20)]),
            30,
        );
        book.load_chat("2");
        assert!(book.delete_chat("2"));
        assert_eq!(book.current_id(), Some("3"));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_delete_last_chat_creates_fresh_one() {
        let mut book = ChatBook::new(sample_map(&[("1", "a", 10)]), 30);
        book.ensure_current();
        assert!(book.delete_chat("1"));
        assert_eq!(book.len(), 1);
        let current = book.current().unwrap();
        assert_ne!(current.id, "1");
        assert_eq!(current.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_delete_other_chat_keeps_current() {
        let mut book = ChatBook::new(sample_map(&[("1", "a", 10), ("2", "b", 20)]), 30);
        book.load_chat("1");
        assert!(book.delete_chat("2"));
        assert_eq!(book.current_id(), Some("1"));
        assert!(!book.delete_chat("2"));
    }

    #[test]
    fn test_history_sorted_by_update_then_id() {
        let book = ChatBook::new(
            sample_map(&[("1", "a", 10), ("2", "b", 30), ("3", "c", 30)]),
            30,
        );
        let ids: Vec<_> = book.history().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_streaming_updates() {
        let mut book = book();
        book.ensure_current();
        let msg = book.add_message(Role::Assistant, "").unwrap();
        assert!(book.append_to_message(&msg.id, "Hel"));
        assert!(book.append_to_message(&msg.id, "lo"));
        assert_eq!(book.message(&msg.id).unwrap().content, "Hello");
        assert!(book.set_message_content(&msg.id, "Error: boom"));
        assert_eq!(book.message(&msg.id).unwrap().content, "Error: boom");
        assert!(!book.append_to_message("missing", "x"));
    }

    #[test]
    fn test_merge_server_wins_and_keeps_current() {
        let mut book = ChatBook::new(sample_map(&[("1", "local", 10), ("2", "mine", 5)]), 30);
        book.load_chat("2");
        book.merge(sample_map(&[("1", "server", 40), ("9", "remote", 1)]));
        assert_eq!(book.len(), 3);
        assert_eq!(book.get("1").unwrap().title, "server");
        assert_eq!(book.current_id(), Some("2"));
    }

    #[test]
    fn test_merge_advances_clock_past_server_ids() {
        let mut book = book();
        let far_future = "99999999999999";
        book.merge(sample_map(&[(far_future, "remote", 1)]));
        let id = book.create_new_chat();
        assert!(id.parse::<i64>().unwrap() > far_future.parse::<i64>().unwrap());
    }

    #[test]
    fn test_resolve_by_id_and_position() {
        let book = ChatBook::new(sample_map(&[("1", "a", 10), ("2", "b", 30)]), 30);
        assert_eq!(book.resolve("1"), Some("1".to_string()));
        assert_eq!(book.resolve("#1"), Some("2".to_string()));
        assert_eq!(book.resolve("#2"), Some("1".to_string()));
        assert_eq!(book.resolve("#3"), None);
        assert_eq!(book.resolve("0"), None);
        assert_eq!(book.resolve("abc"), None);
    }

    #[test]
    fn test_save_and_load_roundtrip_through_store() {
        let (store, _dir) = temp_store();
        let mut book = book();
        book.ensure_current();
        book.add_message(Role::User, "persist me").unwrap();
        book.save(&store).unwrap();

        let loaded = ChatBook::load(&store, 30);
        assert_eq!(loaded.chats(), book.chats());
    }

    #[test]
    fn test_load_corrupt_blob_starts_empty() {
        let (store, _dir) = temp_store();
        store.set(CHATS_KEY, "[not a map").unwrap();
        let loaded = ChatBook::load(&store, 30);
        assert!(loaded.is_empty());
    }
}
