use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{
    params, types::Type, Connection, OptionalExtension, Row, TransactionBehavior,
};

use crate::error::TodoError;
use crate::models::{NewTodo, Todo, TodoChanges, DATE_FORMAT};

const SELECT_TODO: &str =
    "SELECT id, title, description, due_date, is_resolved, created_at, updated_at FROM todos";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn connect<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("opening database at {}", path.as_ref().display()))?;
        let db = Self { conn };
        db.migrate().context("migrating database schema")?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn in_memory() -> anyhow::Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL CHECK (length(trim(title)) > 0),
                description TEXT NOT NULL DEFAULT '',
                due_date TEXT,
                is_resolved INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
    }

    pub fn create(&self, input: &NewTodo) -> Result<Todo, TodoError> {
        let valid = input.validate()?;
        let now = now();
        self.conn.execute(
            "INSERT INTO todos (title, description, due_date, is_resolved, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![
                valid.title,
                valid.description,
                valid.due_date.map(format_date),
                format_timestamp(now),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, "todo created");
        Ok(Todo {
            id,
            title: valid.title,
            description: valid.description,
            due_date: valid.due_date,
            is_resolved: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get(&self, id: i64) -> Result<Todo, TodoError> {
        fetch(&self.conn, id)?.ok_or(TodoError::NotFound(id))
    }

    /// All todos: open before resolved, then by due date (undated last),
    /// newest first.
    pub fn list(&self) -> Result<Vec<Todo>, TodoError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_TODO} ORDER BY is_resolved ASC, due_date IS NULL, due_date ASC, \
             created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], todo_from_row)?;

        let mut todos = Vec::new();
        for todo in rows {
            todos.push(todo?);
        }
        Ok(todos)
    }

    pub fn update(&mut self, id: i64, changes: &TodoChanges) -> Result<Todo, TodoError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut todo = fetch(&tx, id)?.ok_or(TodoError::NotFound(id))?;
        changes.apply_to(&mut todo)?;
        todo.updated_at = touched(todo.updated_at);
        tx.execute(
            "UPDATE todos
             SET title = ?1, description = ?2, due_date = ?3, is_resolved = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                todo.title,
                todo.description,
                todo.due_date.map(format_date),
                todo.is_resolved,
                format_timestamp(todo.updated_at),
                id,
            ],
        )?;
        tx.commit()?;
        tracing::info!(id, "todo updated");
        Ok(todo)
    }

    pub fn delete(&self, id: i64) -> Result<(), TodoError> {
        let deleted = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(TodoError::NotFound(id));
        }
        tracing::info!(id, "todo deleted");
        Ok(())
    }

    pub fn toggle_resolved(&mut self, id: i64) -> Result<Todo, TodoError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut todo = fetch(&tx, id)?.ok_or(TodoError::NotFound(id))?;
        todo.is_resolved = !todo.is_resolved;
        todo.updated_at = touched(todo.updated_at);
        tx.execute(
            "UPDATE todos SET is_resolved = ?1, updated_at = ?2 WHERE id = ?3",
            params![todo.is_resolved, format_timestamp(todo.updated_at), id],
        )?;
        tx.commit()?;
        tracing::info!(id, is_resolved = todo.is_resolved, "todo toggled");
        Ok(todo)
    }
}

fn fetch(conn: &Connection, id: i64) -> rusqlite::Result<Option<Todo>> {
    conn.query_row(
        &format!("{SELECT_TODO} WHERE id = ?1"),
        params![id],
        todo_from_row,
    )
    .optional()
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let due_date: Option<String> = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: due_date.map(|value| parse_date(3, &value)).transpose()?,
        is_resolved: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}

/// Stored timestamps keep microseconds, so values are truncated up front
/// to read back identical.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// The next `updated_at`, strictly after `previous`.
fn touched(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
