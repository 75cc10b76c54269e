//! Test utilities for Growth Chat
//!
//! Temporary stores, sample chats and assertion helpers shared by unit tests.

use crate::chat::{Chat, ChatMap, Message, Role};
use crate::error::GrowthError;
use crate::storage::LocalStore;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a store in a fresh temporary directory
///
/// The directory is returned alongside the store and must be kept alive for
/// as long as the store is used.
pub fn temp_store() -> (LocalStore, TempDir) {
    let dir = temp_dir();
    let store =
        LocalStore::new_with_path(dir.path().join("growth.db")).expect("Failed to create store");
    (store, dir)
}

/// Fixed timestamp `secs` seconds after 2024-01-01T00:00:00Z
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// Build a chat with the given id, title and update time
pub fn sample_chat(id: &str, title: &str, updated_secs: i64) -> Chat {
    Chat {
        id: id.to_string(),
        title: title.to_string(),
        messages: vec![Message {
            id: format!("{}1", id),
            role: Role::User,
            content: title.to_string(),
            timestamp: at(updated_secs),
            kind: None,
        }],
        created_at: at(0),
        updated_at: at(updated_secs),
    }
}

/// Build a chat map from `(id, title, updated_secs)` triples
pub fn sample_map(entries: &[(&str, &str, i64)]) -> ChatMap {
    entries
        .iter()
        .map(|(id, title, secs)| (id.to_string(), sample_chat(id, title, *secs)))
        .collect()
}

/// Assert that an error contains the expected message
pub fn assert_error_contains<T>(result: Result<T, GrowthError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}', got Ok", expected),
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{}', got '{}'",
                expected,
                msg
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_store_is_usable() {
        let (store, dir) = temp_store();
        store.set("k", "v").unwrap();
        assert!(dir.path().join("growth.db").exists());
    }

    #[test]
    fn test_sample_map_orders_by_key() {
        let map = sample_map(&[("2", "b", 5), ("1", "a", 10)]);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(map["1"].updated_at, at(10));
    }

    #[test]
    fn test_assert_error_contains() {
        let result: Result<(), GrowthError> = Err(GrowthError::Config("invalid".to_string()));
        assert_error_contains(result, "invalid");
    }
}
