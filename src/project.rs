//! Projects: the top-level workspace that owns accounts and accesses.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    config::ServiceConfig,
    database_id::ProjectId,
    slug,
    stores::ProjectStore,
    unique::find_unique,
};

/// A workspace identified in URLs by its slug.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    /// The ID of the project.
    pub id: ProjectId,
    /// The unique, URL-safe identifier of the project. Never changes.
    pub slug: String,
    /// The display name.
    pub name: String,
    /// When the project was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the project was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Project {
    /// Create a new project with a fresh ID and timestamps.
    ///
    /// The slug is not checked here, use [create_project] to get a valid and unique slug.
    pub fn new(name: &str, slug: String) -> Self {
        let now = OffsetDateTime::now_utc();

        Self {
            id: ProjectId::new(),
            slug,
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create and store a project.
///
/// When `custom_slug` is given it must be a valid slug that is not in use.
/// Otherwise a slug is derived from `name` and, if taken, suffixed with
/// "-1", "-2", etc. until a free one is found.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyProjectName] if `name` is blank,
/// - [Error::InvalidSlug] or [Error::SlugTaken] for a bad custom slug,
/// - [Error::SlugAttemptsExhausted] if no free slug was found within
///   [ServiceConfig::slug_max_attempts] candidates,
/// - any error from the store.
pub fn create_project(
    name: &str,
    custom_slug: Option<&str>,
    projects: &impl ProjectStore,
    config: &ServiceConfig,
) -> Result<Project, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyProjectName);
    }

    let slug = match custom_slug.map(str::trim).filter(|slug| !slug.is_empty()) {
        Some(custom_slug) => {
            slug::validate(custom_slug).map_err(Error::InvalidSlug)?;

            if projects.exists_by_slug(custom_slug)? {
                return Err(Error::SlugTaken(custom_slug.to_owned()));
            }

            custom_slug.to_owned()
        }
        None => allocate_slug(name, projects, config.slug_max_attempts)?,
    };

    let project = projects.create(Project::new(name, slug))?;
    tracing::info!("Created project \"{}\" with slug {}", project.name, project.slug);

    Ok(project)
}

fn allocate_slug(
    name: &str,
    projects: &impl ProjectStore,
    max_attempts: u32,
) -> Result<String, Error> {
    let base = slug::generate(name);

    find_unique(
        max_attempts,
        |attempt| slug::candidate(&base, attempt),
        |candidate| projects.exists_by_slug(candidate),
    )?
    .ok_or(Error::SlugAttemptsExhausted(max_attempts))
}

#[cfg(test)]
mod create_project_tests {
    use crate::{
        Error, config::ServiceConfig, slug::SlugError, stores::InMemoryStore,
        stores::ProjectStore,
    };

    use super::{Project, create_project};

    fn store_with_slugs(slugs: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new();
        for slug in slugs {
            store
                .create(Project::new("Existing", slug.to_string()))
                .expect("Could not create project");
        }
        store
    }

    #[test]
    fn derives_slug_from_name() {
        let store = InMemoryStore::new();

        let project =
            create_project("Test Project", None, &store, &ServiceConfig::for_tests()).unwrap();

        assert_eq!(project.slug, "test-project");
        assert_eq!(project.name, "Test Project");
        assert_eq!(store.get_by_slug("test-project"), Ok(project));
    }

    #[test]
    fn suffixes_taken_slug() {
        let store = store_with_slugs(&["test-project", "test-project-1"]);

        let project =
            create_project("Test Project", None, &store, &ServiceConfig::for_tests()).unwrap();

        assert_eq!(project.slug, "test-project-2");
    }

    #[test]
    fn fails_when_attempts_run_out() {
        let store = store_with_slugs(&["budget", "budget-1", "budget-2"]);
        let config = ServiceConfig {
            slug_max_attempts: 3,
            ..ServiceConfig::for_tests()
        };

        let result = create_project("Budget", None, &store, &config);

        assert_eq!(result, Err(Error::SlugAttemptsExhausted(3)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "unable to generate unique slug after 3 attempts"
        );
    }

    #[test]
    fn uses_valid_custom_slug() {
        let store = InMemoryStore::new();

        let project = create_project(
            "Test Project",
            Some("house"),
            &store,
            &ServiceConfig::for_tests(),
        )
        .unwrap();

        assert_eq!(project.slug, "house");
    }

    #[test]
    fn rejects_invalid_custom_slug() {
        let store = InMemoryStore::new();

        let result = create_project(
            "Test Project",
            Some("Bad--Slug"),
            &store,
            &ServiceConfig::for_tests(),
        );

        assert_eq!(result, Err(Error::InvalidSlug(SlugError::InvalidCharacter)));
    }

    #[test]
    fn rejects_taken_custom_slug() {
        let store = store_with_slugs(&["house"]);

        let result = create_project("House", Some("house"), &store, &ServiceConfig::for_tests());

        assert_eq!(result, Err(Error::SlugTaken("house".to_owned())));
    }

    #[test]
    fn rejects_empty_name() {
        let store = InMemoryStore::new();

        let result = create_project("   ", None, &store, &ServiceConfig::for_tests());

        assert_eq!(result, Err(Error::EmptyProjectName));
        assert_eq!(
            result.unwrap_err().to_string(),
            "project name is required"
        );
    }
}
