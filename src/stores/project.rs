//! Defines the project store trait.

use crate::{Error, database_id::ProjectId, project::Project};

/// Handles the creation and retrieval of projects.
pub trait ProjectStore {
    /// Store a new project.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEntry] if the slug is already in use.
    fn create(&self, project: Project) -> Result<Project, Error>;

    /// Retrieve the project with the given slug.
    ///
    /// # Errors
    ///
    /// Returns [Error::ProjectNotFound] if there is no such project.
    fn get_by_slug(&self, slug: &str) -> Result<Project, Error>;

    /// Retrieve the project with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::ProjectNotFound] if there is no such project.
    fn get_by_id(&self, id: ProjectId) -> Result<Project, Error>;

    /// Whether a project already uses `slug`.
    fn exists_by_slug(&self, slug: &str) -> Result<bool, Error>;
}
