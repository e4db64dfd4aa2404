//! Read-only access to the loaded medical databases.
//!
//! Each database file holds exactly one table. Connections are opened once
//! at startup with `SQLITE_OPEN_READ_ONLY`, so the agent's query surface
//! cannot mutate the data; a mutating statement fails inside SQLite and the
//! error text flows back to the caller.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::{MedAgentError, Result};

/// Rows echoed back to the agent before the output is cut off.
const MAX_RESULT_ROWS: usize = 50;

/// A single read-only medical database bound to one table.
pub struct MedicalDb {
    label: &'static str,
    table: &'static str,
    conn: Mutex<Connection>,
}

impl MedicalDb {
    /// Open a database file read-only. The file must already exist; run the
    /// loader first.
    pub fn open(db_path: &Path, label: &'static str, table: &'static str) -> Result<Self> {
        if !db_path.exists() {
            return Err(MedAgentError::Database(format!(
                "{} is missing (run `medagent load` to build the databases)",
                db_path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self {
            label,
            table,
            conn: Mutex::new(conn),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Execute a SQL query and render the result as text.
    ///
    /// The output is a pipe-separated header line followed by value rows,
    /// truncated after `MAX_RESULT_ROWS` rows.
    pub fn execute_query(&self, sql: &str) -> Result<String> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(MedAgentError::Database("empty query".to_string()));
        }

        let conn = self.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(sql)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut lines = vec![column_names.join(" | ")];
        let mut total = 0usize;

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            total += 1;
            if total <= MAX_RESULT_ROWS {
                let rendered: Vec<String> = (0..column_names.len())
                    .map(|i| render_value(row.get_ref(i)))
                    .collect();
                lines.push(rendered.join(" | "));
            }
        }

        if total == 0 {
            return Ok(format!("{}\n(no rows)", lines[0]));
        }
        if total > MAX_RESULT_ROWS {
            lines.push(format!("... showing first {} of {} rows", MAX_RESULT_ROWS, total));
        }

        Ok(lines.join("\n"))
    }

    /// One-line schema description used in tool prompts:
    /// `heart_disease(age INTEGER, sex INTEGER, ...) — 303 rows`.
    pub fn schema_summary(&self) -> Result<String> {
        let conn = self.conn.lock().expect("db mutex poisoned");

        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", self.table))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let ty: String = row.get(2)?;
                Ok(format!("{} {}", name, ty))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(MedAgentError::Database(format!(
                "table '{}' not found in {} database",
                self.table, self.label
            )));
        }

        let rows: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.table),
            [],
            |row| row.get(0),
        )?;

        Ok(format!("{}({}) with {} rows", self.table, columns.join(", "), rows))
    }
}

impl std::fmt::Debug for MedicalDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedicalDb")
            .field("label", &self.label)
            .field("table", &self.table)
            .finish()
    }
}

fn render_value(value: std::result::Result<ValueRef<'_>, rusqlite::Error>) -> String {
    match value {
        Ok(ValueRef::Null) => "NULL".to_string(),
        Ok(ValueRef::Integer(i)) => i.to_string(),
        Ok(ValueRef::Real(f)) => f.to_string(),
        Ok(ValueRef::Text(t)) => String::from_utf8_lossy(t).to_string(),
        Ok(ValueRef::Blob(b)) => format!("<{} byte blob>", b.len()),
        Err(e) => format!("<error: {}>", e),
    }
}

/// The three databases the agent can query, opened once per process.
#[derive(Debug)]
pub struct DbRegistry {
    heart: Arc<MedicalDb>,
    cancer: Arc<MedicalDb>,
    diabetes: Arc<MedicalDb>,
}

impl DbRegistry {
    /// Open all three database files under `db_dir`. Missing files are a
    /// startup error; the loader must have run first.
    pub fn open(db_dir: &Path) -> Result<Self> {
        let heart = MedicalDb::open(&db_dir.join("heart_disease.db"), "heart disease", "heart_disease")?;
        let cancer = MedicalDb::open(&db_dir.join("cancer.db"), "cancer", "cancer_prediction")?;
        let diabetes = MedicalDb::open(&db_dir.join("diabetes.db"), "diabetes", "diabetes")?;

        Ok(Self {
            heart: Arc::new(heart),
            cancer: Arc::new(cancer),
            diabetes: Arc::new(diabetes),
        })
    }

    pub fn heart(&self) -> Arc<MedicalDb> {
        Arc::clone(&self.heart)
    }

    pub fn cancer(&self) -> Arc<MedicalDb> {
        Arc::clone(&self.cancer)
    }

    pub fn diabetes(&self) -> Arc<MedicalDb> {
        Arc::clone(&self.diabetes)
    }
}
