//! Initial data for a fresh deployment
//!
//! Seeding is idempotent: the admin principal is reused when its email is
//! already registered, and gems are matched by name.

use crate::store::{GemRepository, UserRepository};
use crate::{GemDraft, NewUser, Result};

/// Owner of the seeded gems
pub const ADMIN_EMAIL: &str = "admin@delhidiscover.com";

/// What a seeding run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// The three places every deployment starts with
pub fn initial_gems() -> Vec<GemDraft> {
    vec![
        GemDraft {
            name: "Agrasen ki Baoli".to_string(),
            description: Some(
                "A 60-meter long and 15-meter wide historical stepwell hidden in the heart of Delhi"
                    .to_string(),
            ),
            address: Some("7B/25, Hailey Rd, Connaught Place, New Delhi, Delhi 110001".to_string()),
            lat: Some(28.6304),
            lng: Some(77.1991),
            image: None,
        },
        GemDraft {
            name: "Lodhi Art District".to_string(),
            description: Some(
                "India's first public art district featuring stunning street art and murals"
                    .to_string(),
            ),
            address: Some("Lodhi Rd, Lodhi Colony, New Delhi, Delhi 110003".to_string()),
            lat: Some(28.5933),
            lng: Some(77.2197),
            image: None,
        },
        GemDraft {
            name: "Sunder Nursery".to_string(),
            description: Some(
                "A 90-acre heritage park with Mughal-era monuments and beautiful gardens"
                    .to_string(),
            ),
            address: Some("Sunder Nagar, Nizamuddin West, New Delhi, Delhi 110013".to_string()),
            lat: Some(28.5942),
            lng: Some(77.2470),
            image: None,
        },
    ]
}

/// Create the admin principal and the initial gems where missing
///
/// `admin_password_hash` is only stored if the admin does not exist yet.
pub async fn seed<S>(store: &S, admin_password_hash: String) -> Result<SeedReport>
where
    S: UserRepository + GemRepository + ?Sized,
{
    let mut report = SeedReport::default();

    let admin = match store.find_by_email(ADMIN_EMAIL).await? {
        Some(user) => user,
        None => {
            report.admin_created = true;
            store
                .create_user(NewUser {
                    email: ADMIN_EMAIL.to_string(),
                    password_hash: admin_password_hash,
                })
                .await?
        }
    };

    for draft in initial_gems() {
        if store.find_gem_by_name(&draft.name).await?.is_some() {
            report.skipped.push(draft.name);
            continue;
        }
        store.create_gem(admin.id, &draft).await?;
        report.created.push(draft.name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();

        let first = seed(&store, "$argon2id$first".to_string()).await.unwrap();
        assert!(first.admin_created);
        assert_eq!(first.created.len(), 3);
        assert!(first.skipped.is_empty());

        let second = seed(&store, "$argon2id$second".to_string()).await.unwrap();
        assert!(!second.admin_created);
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 3);

        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.gem_count().await, 3);

        // The original hash is kept
        let admin = store.find_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert_eq!(admin.password_hash, "$argon2id$first");
    }

    #[tokio::test]
    async fn test_seeded_gems_belong_to_admin() {
        let store = MemoryStore::new();
        seed(&store, "$argon2id$hash".to_string()).await.unwrap();

        let admin = store.find_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        let gems = store.list_gems().await.unwrap();
        assert!(gems.iter().all(|g| g.user_id == admin.id));
        assert!(gems.iter().all(|g| g.user.email == ADMIN_EMAIL));
    }

    #[test]
    fn test_initial_gems_have_valid_coordinates() {
        for gem in initial_gems() {
            assert!(crate::validate_coordinates(gem.lat, gem.lng).is_ok());
        }
    }
}
