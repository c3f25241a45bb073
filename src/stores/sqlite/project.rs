use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error, database_id::ProjectId, datetime::StoredDateTime, project::Project,
    stores::ProjectStore,
};

use super::SQLiteStore;

pub(super) fn create_project_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS project (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

const SELECT_PROJECT: &str = "SELECT id, slug, name, created_at, updated_at FROM project";

fn map_project_row(row: &Row) -> Result<Project, rusqlite::Error> {
    let created_at: StoredDateTime = row.get(3)?;
    let updated_at: StoredDateTime = row.get(4)?;

    Ok(Project {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        created_at: created_at.0,
        updated_at: updated_at.0,
    })
}

impl ProjectStore for SQLiteStore {
    fn create(&self, project: Project) -> Result<Project, Error> {
        self.lock()?.execute(
            "INSERT INTO project (id, slug, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                project.id,
                &project.slug,
                &project.name,
                StoredDateTime(project.created_at),
                StoredDateTime(project.updated_at),
            ),
        )?;

        Ok(project)
    }

    fn get_by_slug(&self, slug: &str) -> Result<Project, Error> {
        self.lock()?
            .prepare(&format!("{SELECT_PROJECT} WHERE slug = ?1"))?
            .query_row((slug,), map_project_row)
            .map_err(|error| Error::from(error).or_not_found(Error::ProjectNotFound))
    }

    fn get_by_id(&self, id: ProjectId) -> Result<Project, Error> {
        self.lock()?
            .prepare(&format!("{SELECT_PROJECT} WHERE id = ?1"))?
            .query_row((id,), map_project_row)
            .map_err(|error| Error::from(error).or_not_found(Error::ProjectNotFound))
    }

    fn exists_by_slug(&self, slug: &str) -> Result<bool, Error> {
        let found = self
            .lock()?
            .query_row("SELECT 1 FROM project WHERE slug = ?1", (slug,), |_| Ok(()))
            .optional()?;

        Ok(found.is_some())
    }
}
