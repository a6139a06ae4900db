use crate::user_models::{UserRecord, UserStore};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Reads the persisted store. A missing file is an empty store, and so is an
/// unreadable or corrupt one (logged, never raised).
pub fn load(path: &Path) -> UserStore {
    if !path.exists() {
        debug!("{} not found, starting with an empty store", path.display());
        return UserStore::new();
    }

    let parsed = fs::read_to_string(path)
        .context("Failed to read users file")
        .and_then(|data| serde_json::from_str(&data).context("Failed to parse users file"));

    match parsed {
        Ok(users) => users,
        Err(e) => {
            warn!("{:#} ({}), starting with an empty store", e, path.display());
            UserStore::new()
        }
    }
}

/// Serializes the whole store over `path`. The previous contents are gone.
pub fn save(path: &Path, users: &UserStore) -> Result<()> {
    let json = serde_json::to_string_pretty(users).context("Failed to serialize users")?;
    fs::write(path, json).context("Failed to write to users file")?;
    Ok(())
}

/// The single gate in front of the users file. Every mutation holds the write
/// lock from load to save, so concurrent requests cannot lose each other's
/// updates.
pub struct UserStorage {
    path: PathBuf,
    users: RwLock<UserStore>,
}

impl UserStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = load(&path);

        Self {
            path,
            users: RwLock::new(users),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts `record` unless `username` is taken. Returns `false` on a
    /// duplicate, leaving the existing record untouched.
    pub async fn insert_new(&self, username: &str, record: UserRecord) -> Result<bool> {
        let mut users = self.users.write().await;

        if users.contains_key(username) {
            return Ok(false);
        }

        users.insert(username.to_string(), record);
        if let Err(e) = save(&self.path, &users) {
            users.remove(username);
            return Err(e);
        }
        Ok(true)
    }

    pub async fn get(&self, username: &str) -> Option<UserRecord> {
        let users = self.users.read().await;
        users.get(username).cloned()
    }

    /// Applies `f` to the user's record and persists the store. Returns `None`
    /// when the user does not exist. If the save fails the in-memory record is
    /// rolled back.
    pub async fn update<F, R>(&self, username: &str, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut UserRecord) -> R,
    {
        let mut users = self.users.write().await;

        let Some(record) = users.get_mut(username) else {
            return Ok(None);
        };
        let previous = record.clone();
        let out = f(record);

        if let Err(e) = save(&self.path, &users) {
            users.insert(username.to_string(), previous);
            return Err(e);
        }
        Ok(Some(out))
    }

    pub async fn usernames(&self) -> Vec<String> {
        let users = self.users.read().await;
        users.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_models::HistoryEntry;
    use tempfile::TempDir;

    fn sample_record() -> UserRecord {
        let mut record = UserRecord::new("hash".to_string());
        record
            .wishlist
            .entry("sad".to_string())
            .or_default()
            .insert("youtube".to_string(), "https://y/1".to_string());
        record.history.push(HistoryEntry {
            emotion: "sad".to_string(),
            platform: "youtube".to_string(),
            timestamp: "2026-01-01 10:00".to_string(),
            link: "https://y/1".to_string(),
        });
        record
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("users.json")).is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load(&path).is_empty());
    }

    #[test]
    fn save_of_load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let mut users = UserStore::new();
        users.insert("alice".to_string(), sample_record());
        users.insert("bob".to_string(), UserRecord::new("other".to_string()));
        save(&path, &users).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        let loaded = load(&path);
        save(&path, &loaded).unwrap();

        assert_eq!(loaded, users);
        assert_eq!(load(&path), users);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[tokio::test]
    async fn insert_new_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::new(dir.path().join("users.json"));

        assert!(storage.insert_new("alice", UserRecord::new("first".into())).await.unwrap());
        assert!(!storage.insert_new("alice", UserRecord::new("second".into())).await.unwrap());

        assert_eq!(storage.get("alice").await.unwrap().password_hash, "first");
        assert_eq!(storage.usernames().await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::new(dir.path().join("users.json"));

        assert!(storage.insert_new("alice", UserRecord::new("a".into())).await.unwrap());
        assert!(storage.insert_new("Alice", UserRecord::new("b".into())).await.unwrap());
        assert_eq!(storage.usernames().await.len(), 2);
    }

    #[tokio::test]
    async fn update_persists_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let storage = UserStorage::new(&path);
        storage.insert_new("alice", UserRecord::new("h".into())).await.unwrap();

        let updated = storage
            .update("alice", |record| record.password_hash = "changed".to_string())
            .await
            .unwrap();
        assert!(updated.is_some());

        let reopened = UserStorage::new(&path);
        assert_eq!(reopened.get("alice").await.unwrap().password_hash, "changed");
    }

    #[tokio::test]
    async fn update_unknown_user_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::new(dir.path().join("users.json"));

        let result = storage.update("ghost", |_| ()).await.unwrap();
        assert!(result.is_none());
        assert!(!storage.path().exists());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let storage = std::sync::Arc::new(UserStorage::new(&path));
        storage.insert_new("alice", UserRecord::new("h".into())).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .update("alice", |record| {
                        record.history.push(HistoryEntry {
                            emotion: format!("e{}", i),
                            platform: "youtube".to_string(),
                            timestamp: "2026-01-01 10:00".to_string(),
                            link: String::new(),
                        })
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(load(&path)["alice"].history.len(), 16);
    }
}
