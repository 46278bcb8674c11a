//! Per-client identity, generated once per storage origin.

use log::info;
use uuid::Uuid;

use crate::error::ChatError;
use crate::storage::Storage;

pub const USER_ID_KEY: &str = "user_id";

/// Look up the stored client id, creating and persisting a fresh one if absent.
/// An empty stored value counts as absent.
pub fn get_or_create_client_identity(storage: &mut dyn Storage) -> Result<String, ChatError> {
    if let Some(existing) = storage.get(USER_ID_KEY)?.filter(|id| !id.is_empty()) {
        return Ok(existing);
    }

    let user_id = Uuid::new_v4().to_string();
    storage.set(USER_ID_KEY, &user_id)?;
    info!("Generated new client identity {}", user_id);
    Ok(user_id)
}

/// Resolved client identity, fixed for the life of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProvider {
    user_id: String,
    persisted: bool,
}

impl IdentityProvider {
    pub fn resolve(storage: &mut dyn Storage) -> Result<Self, ChatError> {
        Ok(Self {
            user_id: get_or_create_client_identity(storage)?,
            persisted: true,
        })
    }

    /// Identity that is never written anywhere; used when storage is unavailable
    pub fn session_only() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            persisted: false,
        }
    }

    #[cfg(test)]
    pub fn fixed(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            persisted: false,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};

    #[test]
    fn test_identity_is_stable_across_reloads() {
        let dir = tempfile::tempdir().unwrap();

        let first = {
            let mut storage = FileStorage::open(dir.path()).unwrap();
            get_or_create_client_identity(&mut storage).unwrap()
        };
        for _ in 0..3 {
            let mut storage = FileStorage::open(dir.path()).unwrap();
            assert_eq!(get_or_create_client_identity(&mut storage).unwrap(), first);
        }
    }

    #[test]
    fn test_identity_differs_between_origins() {
        let mut a = MemoryStorage::new();
        let mut b = MemoryStorage::new();
        let id_a = get_or_create_client_identity(&mut a).unwrap();
        let id_b = get_or_create_client_identity(&mut b).unwrap();
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_identity_is_v4_uuid() {
        let mut storage = MemoryStorage::new();
        let id = get_or_create_client_identity(&mut storage).unwrap();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_existing_identity_returned_unchanged() {
        let mut storage = MemoryStorage::new();
        storage.set(USER_ID_KEY, "abc-123").unwrap();
        assert_eq!(get_or_create_client_identity(&mut storage).unwrap(), "abc-123");
    }

    #[test]
    fn test_empty_stored_identity_is_replaced() {
        let mut storage = MemoryStorage::new();
        storage.set(USER_ID_KEY, "").unwrap();

        let id = get_or_create_client_identity(&mut storage).unwrap();
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
        assert_eq!(storage.get(USER_ID_KEY).unwrap().as_deref(), Some(id.as_str()));
        assert_eq!(get_or_create_client_identity(&mut storage).unwrap(), id);
    }

    #[test]
    fn test_resolve_marks_persisted() {
        let mut storage = MemoryStorage::new();
        let provider = IdentityProvider::resolve(&mut storage).unwrap();
        assert!(provider.is_persisted());
        assert_eq!(storage.get(USER_ID_KEY).unwrap().as_deref(), Some(provider.user_id()));

        assert!(!IdentityProvider::session_only().is_persisted());
    }
}
