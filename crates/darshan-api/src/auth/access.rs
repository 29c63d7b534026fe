//! Ownership checks for mutating owned resources
//!
//! Existence is checked before ownership: a missing resource is 404 for
//! everyone, and only an existing resource owned by someone else yields 403.
//! The guard has no side effects; callers decide what to log.

use super::middleware::Principal;
use crate::error::AppError;
use darshan_core::Owned;

/// Message returned with 403 responses
pub const FORBIDDEN_MESSAGE: &str = "Unauthorized";

/// Allow the mutation only if `principal` created `resource`
pub fn ensure_owner<R: Owned>(resource: &R, principal: &Principal) -> Result<(), AppError> {
    if resource.owner_id() == principal.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
    }
}

/// Resolve a looked-up resource for mutation by `principal`
///
/// `kind` names the resource in the 404 message, e.g. "Hidden gem".
pub fn authorize_mutation<R: Owned>(
    resource: Option<R>,
    principal: &Principal,
    kind: &str,
) -> Result<R, AppError> {
    let resource = resource.ok_or_else(|| AppError::NotFound(kind.to_string()))?;
    ensure_owner(&resource, principal)?;

    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[derive(Debug)]
    struct Note {
        owner: Uuid,
    }

    impl Owned for Note {
        fn owner_id(&self) -> Uuid {
            self.owner
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let owner = Uuid::new_v4();
        let note = Note { owner };
        let principal = Principal { user_id: owner };

        assert!(ensure_owner(&note, &principal).is_ok());
        assert!(authorize_mutation(Some(note), &principal, "Note").is_ok());
    }

    #[test]
    fn test_non_owner_is_forbidden() {
        let note = Note {
            owner: Uuid::new_v4(),
        };
        let principal = Principal {
            user_id: Uuid::new_v4(),
        };

        let err = authorize_mutation(Some(note), &principal, "Note").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_missing_resource_is_not_found_for_anyone() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
        };

        let err = authorize_mutation::<Note>(None, &principal, "Note").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Note not found");
    }
}
