use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    access::{Access, PinHash},
    database_id::{AccessId, ProjectId},
    datetime::StoredDateTime,
    stores::AccessStore,
};

use super::SQLiteStore;

pub(super) fn create_access_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS access (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            uid TEXT NOT NULL,
            pin TEXT NOT NULL,
            name TEXT NOT NULL,
            readonly INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(project_id, uid),
            FOREIGN KEY(project_id) REFERENCES project(id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

const SELECT_ACCESS: &str =
    "SELECT id, project_id, uid, pin, name, readonly, created_at, updated_at FROM access";

fn map_access_row(row: &Row) -> Result<Access, rusqlite::Error> {
    let raw_pin_hash: String = row.get(3)?;
    let created_at: StoredDateTime = row.get(6)?;
    let updated_at: StoredDateTime = row.get(7)?;

    Ok(Access {
        id: row.get(0)?,
        project_id: row.get(1)?,
        uid: row.get(2)?,
        pin_hash: PinHash::new_unchecked(&raw_pin_hash),
        name: row.get(4)?,
        readonly: row.get(5)?,
        created_at: created_at.0,
        updated_at: updated_at.0,
    })
}

impl AccessStore for SQLiteStore {
    fn create(&self, access: Access) -> Result<Access, Error> {
        self.lock()?.execute(
            "INSERT INTO access (id, project_id, uid, pin, name, readonly, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                access.id,
                access.project_id,
                &access.uid,
                access.pin_hash.as_str(),
                &access.name,
                access.readonly,
                StoredDateTime(access.created_at),
                StoredDateTime(access.updated_at),
            ),
        )?;

        Ok(access)
    }

    fn get_by_id(&self, id: AccessId) -> Result<Access, Error> {
        self.lock()?
            .prepare(&format!("{SELECT_ACCESS} WHERE id = ?1"))?
            .query_row((id,), map_access_row)
            .map_err(|error| Error::from(error).or_not_found(Error::AccessNotFound))
    }

    fn get_by_project_id(&self, project_id: ProjectId) -> Result<Vec<Access>, Error> {
        self.lock()?
            .prepare(&format!(
                "{SELECT_ACCESS} WHERE project_id = ?1 ORDER BY created_at, rowid"
            ))?
            .query_map((project_id,), map_access_row)?
            .map(|maybe_access| maybe_access.map_err(Error::from))
            .collect()
    }

    fn get_by_uid(&self, project_id: ProjectId, uid: &str) -> Result<Access, Error> {
        self.lock()?
            .prepare(&format!(
                "{SELECT_ACCESS} WHERE project_id = ?1 AND uid = ?2"
            ))?
            .query_row((project_id, uid), map_access_row)
            .map_err(|error| Error::from(error).or_not_found(Error::AccessNotFound))
    }

    fn exists_by_uid(&self, project_id: ProjectId, uid: &str) -> Result<bool, Error> {
        let found = self
            .lock()?
            .query_row(
                "SELECT 1 FROM access WHERE project_id = ?1 AND uid = ?2",
                (project_id, uid),
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }
}
