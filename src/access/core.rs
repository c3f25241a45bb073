//! Project accesses: numeric credentials that let a person view or edit a project.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    access::pin::{self, PIN_LENGTH, PinHash, UID_LENGTH},
    config::ServiceConfig,
    database_id::{AccessId, ProjectId},
    stores::{AccessStore, ProjectStore},
    unique::find_unique,
};

/// A credential for logging in to a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Access {
    /// The ID of the access.
    pub id: AccessId,
    /// The project this access grants entry to.
    pub project_id: ProjectId,
    /// The 2-digit identifier, unique within the project.
    pub uid: String,
    /// The bcrypt hash of the 8-digit PIN.
    #[serde(skip)]
    pub pin_hash: PinHash,
    /// Who the access was issued to.
    pub name: String,
    /// Read-only accesses may view the project but not change it.
    pub readonly: bool,
    /// When the access was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the access was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Access {
    /// Create a new access with a fresh ID and timestamps.
    pub fn new(
        project_id: ProjectId,
        uid: String,
        pin_hash: PinHash,
        name: &str,
        readonly: bool,
    ) -> Self {
        let now = OffsetDateTime::now_utc();

        Self {
            id: AccessId::new(),
            project_id,
            uid,
            pin_hash,
            name: name.to_owned(),
            readonly,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A newly created access along with its PIN in plain text.
///
/// The PIN cannot be recovered after this is dropped.
#[derive(Debug, Clone)]
pub struct CreatedAccess {
    /// The stored access.
    pub access: Access,
    /// The 8-digit PIN.
    pub pin: String,
}

/// Issue a new access for the project with the slug `project_slug`.
///
/// A random UID that is free within the project is assigned, and a random PIN
/// is generated and hashed.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyName] if `name` is blank,
/// - [Error::ProjectNotFound] if there is no such project,
/// - [Error::UidAttemptsExhausted] if no free UID was found within
///   [ServiceConfig::uid_max_attempts] tries,
/// - [Error::HashingError] or any error from the stores.
pub fn create_access(
    project_slug: &str,
    name: &str,
    readonly: bool,
    projects: &impl ProjectStore,
    accesses: &impl AccessStore,
    config: &ServiceConfig,
) -> Result<CreatedAccess, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let project = projects.get_by_slug(project_slug)?;

    let uid = find_unique(
        config.uid_max_attempts,
        |_| pin::generate_uid(),
        |uid| accesses.exists_by_uid(project.id, uid),
    )?
    .ok_or(Error::UidAttemptsExhausted(config.uid_max_attempts))?;

    let pin = pin::generate_pin();
    let pin_hash = PinHash::new(&pin, config.pin_hash_cost)?;

    let access = accesses.create(Access::new(project.id, uid, pin_hash, name, readonly))?;
    tracing::info!(
        "Created {} access {} for project {}",
        if access.readonly { "read-only" } else { "read-write" },
        access.uid,
        project.slug
    );

    Ok(CreatedAccess { access, pin })
}

/// Check a UID and PIN against the accesses of a project.
///
/// # Errors
///
/// Returns [Error::InvalidCredentialFormat] if the UID or PIN do not have the
/// right number of digits, [Error::InvalidCredentials] if no access matches,
/// or [Error::HashingError] if the stored hash could not be checked.
pub fn authenticate(
    project_id: ProjectId,
    uid: &str,
    pin: &str,
    accesses: &impl AccessStore,
) -> Result<Access, Error> {
    if !pin::is_numeric_code(uid, UID_LENGTH) || !pin::is_numeric_code(pin, PIN_LENGTH) {
        return Err(Error::InvalidCredentialFormat);
    }

    let access = match accesses.get_by_uid(project_id, uid) {
        Ok(access) => access,
        Err(Error::AccessNotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    let is_match = access.pin_hash.verify(pin).map_err(|error| {
        tracing::error!("could not verify PIN for access {}: {error}", access.id);
        Error::HashingError(error.to_string())
    })?;

    if is_match {
        Ok(access)
    } else {
        Err(Error::InvalidCredentials)
    }
}


#[cfg(test)]
mod authenticate_tests {
    use crate::{
        Error,
        access::pin::PinHash,
        database_id::ProjectId,
        stores::{AccessStore, InMemoryStore},
    };

    use super::{Access, authenticate};

    fn store_with_access(project_id: ProjectId) -> (InMemoryStore, Access) {
        let store = InMemoryStore::new();
        let access = store
            .create(Access::new(
                project_id,
                "42".to_owned(),
                PinHash::new("12345678", 4).unwrap(),
                "Alice",
                false,
            ))
            .unwrap();

        (store, access)
    }

    #[test]
    fn matching_credentials_return_access() {
        let project_id = ProjectId::new();
        let (store, access) = store_with_access(project_id);

        assert_eq!(authenticate(project_id, "42", "12345678", &store), Ok(access));
    }

    #[test]
    fn wrong_pin_is_invalid_credentials() {
        let project_id = ProjectId::new();
        let (store, _) = store_with_access(project_id);

        let result = authenticate(project_id, "42", "00000000", &store);

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn unknown_uid_is_invalid_credentials() {
        let project_id = ProjectId::new();
        let (store, _) = store_with_access(project_id);

        assert_eq!(
            authenticate(project_id, "43", "12345678", &store),
            Err(Error::InvalidCredentials)
        );
        assert_eq!(
            authenticate(ProjectId::new(), "42", "12345678", &store),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn malformed_credentials_are_rejected_before_lookup() {
        let project_id = ProjectId::new();
        let (store, _) = store_with_access(project_id);

        for (uid, pin) in [("4", "12345678"), ("42", "1234567"), ("4x", "12345678")] {
            let result = authenticate(project_id, uid, pin, &store);

            assert_eq!(result, Err(Error::InvalidCredentialFormat), "{uid}/{pin}");
        }
        assert_eq!(
            Error::InvalidCredentialFormat.to_string(),
            "invalid UID or PIN format"
        );
    }
}
