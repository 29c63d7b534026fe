//! Hidden gems service
//!
//! Reads are public. Every mutation takes the acting [`Principal`]
//! explicitly; creation stamps it as owner, update and delete go through
//! the ownership guard first.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::access::authorize_mutation;
use crate::auth::Principal;
use crate::error::AppError;
use darshan_core::{validate_coordinates, GemDraft, GemPatch, GemRepository, HiddenGem, Owned};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const RESOURCE: &str = "Hidden gem";

/// Create / update request body
///
/// Every field is optional at the wire level; creation requires `name`.
/// Unknown fields (including any client-supplied owner) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GemPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image: Option<String>,
}

impl GemPayload {
    /// Validate as a creation payload
    pub fn into_draft(self) -> Result<GemDraft, AppError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(AppError::BadRequest("Name is required".to_string())),
        };
        validate_coordinates(self.lat, self.lng)?;

        Ok(GemDraft {
            name,
            description: self.description,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            image: self.image,
        })
    }

    /// Validate as a partial update
    pub fn into_patch(self) -> Result<GemPatch, AppError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::BadRequest("Name is required".to_string()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        validate_coordinates(self.lat, self.lng)?;

        Ok(GemPatch {
            name,
            description: self.description,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            image: self.image,
        })
    }
}

/// Parse a path id; anything that is not a UUID cannot name a gem
pub fn parse_gem_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(RESOURCE.to_string()))
}

#[derive(Clone)]
pub struct GemService {
    gems: Arc<dyn GemRepository>,
}

impl GemService {
    pub fn new(gems: Arc<dyn GemRepository>) -> Self {
        Self { gems }
    }

    pub async fn list(&self) -> Result<Vec<HiddenGem>, AppError> {
        Ok(self.gems.list_gems().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<HiddenGem, AppError> {
        self.gems
            .get_gem(id)
            .await?
            .ok_or_else(|| AppError::NotFound(RESOURCE.to_string()))
    }

    /// Create a gem owned by `principal`
    pub async fn create(
        &self,
        principal: &Principal,
        payload: GemPayload,
    ) -> Result<HiddenGem, AppError> {
        let draft = payload.into_draft()?;
        let gem = self.gems.create_gem(principal.user_id, &draft).await?;

        tracing::info!(gem_id = %gem.id, user_id = %principal.user_id, "Hidden gem created");
        Ok(gem)
    }

    /// Fetch a gem that `principal` is allowed to mutate
    ///
    /// 404 if it does not exist, 403 if someone else owns it.
    pub async fn authorize(&self, principal: &Principal, id: Uuid) -> Result<HiddenGem, AppError> {
        let existing = self.gems.get_gem(id).await?;
        let owner_id = existing.as_ref().map(|gem| gem.owner_id());

        authorize_mutation(existing, principal, RESOURCE).inspect_err(|err| {
            if matches!(err, AppError::Forbidden(_)) {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: principal.user_id,
                    resource: RESOURCE.to_string(),
                    resource_id: Some(id),
                    owner_id,
                });
            }
        })
    }

    /// Update a gem; the payload is validated only once ownership is settled
    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: GemPayload,
    ) -> Result<HiddenGem, AppError> {
        self.authorize(principal, id).await?;

        let patch = payload.into_patch()?;

        // Owner is immutable, so the gem can only have vanished in between
        let gem = self
            .gems
            .update_gem(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(RESOURCE.to_string()))?;

        tracing::info!(gem_id = %id, user_id = %principal.user_id, "Hidden gem updated");
        Ok(gem)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.authorize(principal, id).await?;

        if !self.gems.delete_gem(id).await? {
            return Err(AppError::NotFound(RESOURCE.to_string()));
        }

        tracing::info!(gem_id = %id, user_id = %principal.user_id, "Hidden gem deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use darshan_core::{MemoryStore, NewUser, UserRepository};

    async fn setup() -> (GemService, Principal, Principal) {
        let store = Arc::new(MemoryStore::new());
        let mut principals = Vec::new();
        for email in ["a@x.com", "b@x.com"] {
            let user = store
                .create_user(NewUser {
                    email: email.to_string(),
                    password_hash: "$argon2id$stub".to_string(),
                })
                .await
                .unwrap();
            principals.push(Principal { user_id: user.id });
        }
        (GemService::new(store), principals[0], principals[1])
    }

    fn named(name: &str) -> GemPayload {
        GemPayload {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_requires_name() {
        let err = GemPayload::default().into_draft().unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        let err = named("   ").into_draft().unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        assert_eq!(named(" Sunder Nursery ").into_draft().unwrap().name, "Sunder Nursery");
    }

    #[test]
    fn test_patch_rejects_blank_name_and_bad_coordinates() {
        assert!(GemPayload::default().into_patch().unwrap().is_empty());
        assert!(named("").into_patch().is_err());

        let payload = GemPayload {
            lat: Some(120.0),
            ..Default::default()
        };
        assert_eq!(
            payload.into_patch().unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        let err = parse_gem_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Hidden gem not found");
    }

    #[tokio::test]
    async fn test_owner_can_update_and_delete() {
        let (service, alice, _) = setup().await;
        let gem = service.create(&alice, named("Agrasen ki Baoli")).await.unwrap();
        assert_eq!(gem.user_id, alice.user_id);
        assert_eq!(gem.user.email, "a@x.com");

        let updated = service
            .update(
                &alice,
                gem.id,
                GemPayload {
                    description: Some("Stepwell".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Stepwell"));
        assert_eq!(updated.name, "Agrasen ki Baoli");

        service.delete(&alice, gem.id).await.unwrap();
        assert_eq!(
            service.get(gem.id).await.unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_even_with_invalid_body() {
        let (service, alice, bob) = setup().await;
        let gem = service.create(&alice, named("Lodhi Art District")).await.unwrap();

        let err = service.update(&bob, gem.id, named("")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = service.delete(&bob, gem.id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        // Untouched
        assert_eq!(service.get(gem.id).await.unwrap().name, "Lodhi Art District");
    }

    #[tokio::test]
    async fn test_missing_gem_is_not_found_for_anyone() {
        let (service, alice, _) = setup().await;
        let id = Uuid::new_v4();

        assert_eq!(
            service.update(&alice, id, named("x")).await.unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            service.delete(&alice, id).await.unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
    }
}
