//! Template storage: one canonical template per workout type.

use rusqlite::{Connection, OptionalExtension};

use crate::model::{TemplateDefinition, WorkoutType};

use super::{Result, Storage};

impl Storage {
    pub(super) fn load_template(
        &self,
        workout_type: WorkoutType,
    ) -> Result<Option<TemplateDefinition>> {
        let conn = self.open_db()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM templates WHERE workout_type = ?1",
                [workout_type.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
    }

    pub(super) fn save_template(&self, template: &TemplateDefinition) -> Result<()> {
        let conn = self.open_db()?;
        write_template(&conn, template)
    }
}

/// Inserts or replaces the template for its workout type.
pub(super) fn write_template(conn: &Connection, template: &TemplateDefinition) -> Result<()> {
    conn.execute(
        "INSERT INTO templates (workout_type, body) VALUES (?1, ?2)
         ON CONFLICT (workout_type) DO UPDATE SET body = excluded.body",
        rusqlite::params![
            template.workout_type.as_str(),
            serde_json::to_string(template)?
        ],
    )?;
    Ok(())
}
