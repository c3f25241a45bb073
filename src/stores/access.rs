//! Defines the access store trait.

use crate::{
    Error,
    access::Access,
    database_id::{AccessId, ProjectId},
};

/// Handles the creation and retrieval of project accesses.
pub trait AccessStore {
    /// Store a new access.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEntry] if the UID is already used in the project.
    fn create(&self, access: Access) -> Result<Access, Error>;

    /// Retrieve the access with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccessNotFound] if there is no such access.
    fn get_by_id(&self, id: AccessId) -> Result<Access, Error>;

    /// Retrieve every access of a project, oldest first.
    fn get_by_project_id(&self, project_id: ProjectId) -> Result<Vec<Access>, Error>;

    /// Retrieve the access with the UID `uid` in a project.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccessNotFound] if there is no such access.
    fn get_by_uid(&self, project_id: ProjectId, uid: &str) -> Result<Access, Error>;

    /// Whether the UID `uid` is already used in a project.
    fn exists_by_uid(&self, project_id: ProjectId, uid: &str) -> Result<bool, Error>;
}
