//! In-memory store
//!
//! Used for local development without PostgreSQL and by the test suites.
//! Enforces the same unique-email constraint as the relational schema.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{GemRepository, UserRepository};
use crate::{DarshanError, GemDraft, GemOwner, GemPatch, HiddenGem, NewUser, Result, User};

/// Process-local store backed by hash maps
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    gems: RwLock<HashMap<Uuid, HiddenGem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn gem_count(&self) -> usize {
        self.gems.read().await.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(DarshanError::Conflict("Email already registered".to_string()));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl GemRepository for MemoryStore {
    async fn list_gems(&self) -> Result<Vec<HiddenGem>> {
        let mut gems: Vec<HiddenGem> = self.gems.read().await.values().cloned().collect();
        gems.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(gems)
    }

    async fn get_gem(&self, id: Uuid) -> Result<Option<HiddenGem>> {
        Ok(self.gems.read().await.get(&id).cloned())
    }

    async fn find_gem_by_name(&self, name: &str) -> Result<Option<HiddenGem>> {
        let gems = self.gems.read().await;
        Ok(gems.values().find(|g| g.name == name).cloned())
    }

    async fn create_gem(&self, owner: Uuid, draft: &GemDraft) -> Result<HiddenGem> {
        // Mirrors the foreign key on hidden_gems.user_id
        let email = self
            .users
            .read()
            .await
            .get(&owner)
            .map(|u| u.email.clone())
            .ok_or_else(|| DarshanError::DatabaseError(format!("Unknown owner {owner}")))?;

        let now = Utc::now();
        let gem = HiddenGem {
            id: Uuid::new_v4(),
            user_id: owner,
            name: draft.name.clone(),
            description: draft.description.clone(),
            address: draft.address.clone(),
            lat: draft.lat,
            lng: draft.lng,
            image: draft.image.clone(),
            created_at: now,
            updated_at: now,
            user: GemOwner { email },
        };
        self.gems.write().await.insert(gem.id, gem.clone());

        Ok(gem)
    }

    async fn update_gem(&self, id: Uuid, patch: &GemPatch) -> Result<Option<HiddenGem>> {
        let mut gems = self.gems.write().await;
        Ok(gems.get_mut(&id).map(|gem| {
            patch.apply(gem);
            gem.clone()
        }))
    }

    async fn delete_gem(&self, id: Uuid) -> Result<bool> {
        Ok(self.gems.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();

        let err = store.create_user(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, DarshanError::Conflict(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();

        assert!(store.find_by_email("a@x.com").await.unwrap().is_some());
        assert!(store.find_by_email("A@X.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_gem_lifecycle() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("owner@x.com")).await.unwrap();

        let gem = store
            .create_gem(
                owner.id,
                &GemDraft {
                    name: "Lodhi Art District".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(gem.user_id, owner.id);
        assert_eq!(gem.user.email, "owner@x.com");

        let patch = GemPatch {
            address: Some("Lodhi Colony".to_string()),
            ..Default::default()
        };
        let updated = store.update_gem(gem.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.address.as_deref(), Some("Lodhi Colony"));
        assert_eq!(updated.name, "Lodhi Art District");

        assert!(store.delete_gem(gem.id).await.unwrap());
        assert!(!store.delete_gem(gem.id).await.unwrap());
        assert!(store.get_gem(gem.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_gem() {
        let store = MemoryStore::new();
        let result = store
            .update_gem(Uuid::new_v4(), &GemPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_gem_requires_existing_owner() {
        let store = MemoryStore::new();
        let draft = GemDraft {
            name: "Orphan".to_string(),
            ..Default::default()
        };
        assert!(store.create_gem(Uuid::new_v4(), &draft).await.is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("o@x.com")).await.unwrap();

        for name in ["first", "second", "third"] {
            let draft = GemDraft {
                name: name.to_string(),
                ..Default::default()
            };
            store.create_gem(owner.id, &draft).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let names: Vec<String> = store
            .list_gems()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }
}
