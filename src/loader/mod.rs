//! Dataset loading: CSV files into per-dataset SQLite databases.
//!
//! Each dataset is one CSV that becomes exactly one table in its own SQLite
//! file. Headers are normalized (lowercase, spaces to underscores), column
//! affinities are sniffed from the data, and reloading fully replaces the
//! table.

use std::path::Path;

use csv::ReaderBuilder;
use log::info;
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;

use crate::error::{MedAgentError, Result};

/// One dataset: source CSV, target database file, target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub csv_file: &'static str,
    pub db_file: &'static str,
    pub table: &'static str,
}

impl DatasetSpec {
    pub const fn new(csv_file: &'static str, db_file: &'static str, table: &'static str) -> Self {
        Self {
            csv_file,
            db_file,
            table,
        }
    }

    /// The three medical datasets this agent serves.
    pub fn builtin() -> Vec<DatasetSpec> {
        vec![
            DatasetSpec::new("heart.csv", "heart_disease.db", "heart_disease"),
            DatasetSpec::new("cancer.csv", "cancer.db", "cancer_prediction"),
            DatasetSpec::new("diabetes.csv", "diabetes.db", "diabetes"),
        ]
    }
}

/// Summary of a completed dataset load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub table: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Normalize a CSV header: trim, lowercase, spaces to underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// SQLite column affinity inferred from the CSV values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnAffinity {
    Integer,
    Real,
    Text,
}

impl ColumnAffinity {
    fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Demote the affinity so it still admits `value`. Empty cells are NULL
    /// and constrain nothing.
    fn narrow(self, value: &str) -> Self {
        if value.is_empty() {
            return self;
        }
        match self {
            Self::Integer => {
                if value.parse::<i64>().is_ok() {
                    Self::Integer
                } else if value.parse::<f64>().is_ok() {
                    Self::Real
                } else {
                    Self::Text
                }
            }
            Self::Real => {
                if value.parse::<f64>().is_ok() {
                    Self::Real
                } else {
                    Self::Text
                }
            }
            Self::Text => Self::Text,
        }
    }

    fn to_sql_value(&self, raw: &str) -> SqlValue {
        if raw.is_empty() {
            return SqlValue::Null;
        }
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(raw.to_string())),
            Self::Real => raw
                .parse::<f64>()
                .map(SqlValue::Real)
                .unwrap_or_else(|_| SqlValue::Text(raw.to_string())),
            Self::Text => SqlValue::Text(raw.to_string()),
        }
    }
}

/// Load one dataset from `data_dir` into its SQLite file under `db_dir`.
///
/// Replace semantics: a pre-existing table of the same name is dropped
/// before the new one is written, all inside a single transaction.
pub fn load_dataset(data_dir: &Path, db_dir: &Path, spec: &DatasetSpec) -> Result<LoadReport> {
    let csv_path = data_dir.join(spec.csv_file);
    if !csv_path.exists() {
        return Err(MedAgentError::DatasetNotFound(format!(
            "{} (expected in {})",
            spec.csv_file,
            data_dir.display()
        )));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(&csv_path)
        .map_err(|e| MedAgentError::Loader(format!("Failed to open {}: {}", spec.csv_file, e)))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| MedAgentError::Loader(format!("Failed to read headers of {}: {}", spec.csv_file, e)))?
        .iter()
        .map(normalize_header)
        .collect();

    if columns.is_empty() {
        return Err(MedAgentError::Loader(format!(
            "{} has no columns",
            spec.csv_file
        )));
    }

    let mut rows: Vec<csv::StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| MedAgentError::Loader(format!("Malformed row in {}: {}", spec.csv_file, e)))?;
        rows.push(record);
    }

    // Sniff affinities column by column across all rows
    let mut affinities = vec![ColumnAffinity::Integer; columns.len()];
    for row in &rows {
        for (i, value) in row.iter().enumerate() {
            if i < affinities.len() {
                affinities[i] = affinities[i].narrow(value.trim());
            }
        }
    }

    std::fs::create_dir_all(db_dir)?;
    let db_path = db_dir.join(spec.db_file);
    let mut conn = Connection::open(&db_path)?;

    let column_defs: Vec<String> = columns
        .iter()
        .zip(&affinities)
        .map(|(name, affinity)| format!("\"{}\" {}", name, affinity.sql_type()))
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let insert_sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        spec.table,
        columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders.join(", ")
    );

    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS \"{}\"; CREATE TABLE \"{}\" ({});",
        spec.table,
        spec.table,
        column_defs.join(", ")
    ))?;

    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for row in &rows {
            let values: Vec<SqlValue> = affinities
                .iter()
                .zip(row.iter())
                .map(|(affinity, raw)| affinity.to_sql_value(raw.trim()))
                .collect();
            stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;

    info!(
        "Loaded {} rows from {} into {}::{}",
        rows.len(),
        spec.csv_file,
        spec.db_file,
        spec.table
    );

    Ok(LoadReport {
        table: spec.table.to_string(),
        rows: rows.len(),
        columns,
    })
}

/// Load every dataset, isolating failures: a missing or malformed CSV fails
/// only its own dataset, and the remaining siblings are still attempted.
pub fn load_all(data_dir: &Path, db_dir: &Path) -> Vec<(DatasetSpec, Result<LoadReport>)> {
    DatasetSpec::builtin()
        .into_iter()
        .map(|spec| {
            let outcome = load_dataset(data_dir, db_dir, &spec);
            (spec, outcome)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn table_rows(db_path: &Path, table: &str) -> i64 {
        let conn = Connection::open(db_path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    fn table_columns(db_path: &Path, table: &str) -> Vec<String> {
        let conn = Connection::open(db_path).unwrap();
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info(\"{}\")", table))
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn test_normalize_header_lowercase() {
        assert_eq!(normalize_header("Age"), "age");
    }

    #[test]
    fn test_normalize_header_spaces() {
        assert_eq!(normalize_header("Chest Pain"), "chest_pain");
    }

    #[test]
    fn test_normalize_header_trims() {
        assert_eq!(normalize_header("  Resting BP  "), "resting_bp");
    }

    #[test]
    fn test_normalize_header_already_normal() {
        assert_eq!(normalize_header("glucose"), "glucose");
    }

    #[test]
    fn test_affinity_integer_column() {
        let mut a = ColumnAffinity::Integer;
        for v in ["1", "42", "-7"] {
            a = a.narrow(v);
        }
        assert_eq!(a, ColumnAffinity::Integer);
    }

    #[test]
    fn test_affinity_demotes_to_real() {
        let mut a = ColumnAffinity::Integer;
        for v in ["1", "2.5"] {
            a = a.narrow(v);
        }
        assert_eq!(a, ColumnAffinity::Real);
    }

    #[test]
    fn test_affinity_demotes_to_text() {
        let mut a = ColumnAffinity::Integer;
        for v in ["1", "2.5", "high"] {
            a = a.narrow(v);
        }
        assert_eq!(a, ColumnAffinity::Text);
    }

    #[test]
    fn test_affinity_empty_values_ignored() {
        let mut a = ColumnAffinity::Integer;
        for v in ["", "3", ""] {
            a = a.narrow(v);
        }
        assert_eq!(a, ColumnAffinity::Integer);
    }

    #[test]
    fn test_load_dataset_row_count_and_headers() {
        let data = TempDir::new().unwrap();
        let dbs = TempDir::new().unwrap();
        write_csv(
            data.path(),
            "heart.csv",
            "Age, Sex, Chest Pain\n63,1,3\n37,1,2\n41,0,1\n",
        );

        let spec = DatasetSpec::new("heart.csv", "heart_disease.db", "heart_disease");
        let report = load_dataset(data.path(), dbs.path(), &spec).unwrap();

        assert_eq!(report.rows, 3);
        assert_eq!(report.columns, vec!["age", "sex", "chest_pain"]);

        let db_path = dbs.path().join("heart_disease.db");
        assert_eq!(table_rows(&db_path, "heart_disease"), 3);
        assert_eq!(
            table_columns(&db_path, "heart_disease"),
            vec!["age", "sex", "chest_pain"]
        );
    }

    #[test]
    fn test_load_dataset_missing_csv() {
        let data = TempDir::new().unwrap();
        let dbs = TempDir::new().unwrap();
        let spec = DatasetSpec::new("heart.csv", "heart_disease.db", "heart_disease");

        let err = load_dataset(data.path(), dbs.path(), &spec).unwrap_err();
        assert!(matches!(err, MedAgentError::DatasetNotFound(_)));
        assert!(err.to_string().contains("heart.csv"));
    }

    #[test]
    fn test_load_dataset_replace_is_idempotent() {
        let data = TempDir::new().unwrap();
        let dbs = TempDir::new().unwrap();
        write_csv(data.path(), "diabetes.csv", "Glucose,Outcome\n148,1\n85,0\n");
        let spec = DatasetSpec::new("diabetes.csv", "diabetes.db", "diabetes");

        load_dataset(data.path(), dbs.path(), &spec).unwrap();
        load_dataset(data.path(), dbs.path(), &spec).unwrap();

        let db_path = dbs.path().join("diabetes.db");
        assert_eq!(table_rows(&db_path, "diabetes"), 2);

        let conn = Connection::open(&db_path).unwrap();
        let glucose: i64 = conn
            .query_row("SELECT glucose FROM diabetes WHERE outcome = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(glucose, 148);
    }

    #[test]
    fn test_load_dataset_type_affinities() {
        let data = TempDir::new().unwrap();
        let dbs = TempDir::new().unwrap();
        write_csv(
            data.path(),
            "cancer.csv",
            "Id,Radius Mean,Diagnosis\n1,17.99,M\n2,20.57,B\n",
        );
        let spec = DatasetSpec::new("cancer.csv", "cancer.db", "cancer_prediction");
        load_dataset(data.path(), dbs.path(), &spec).unwrap();

        let conn = Connection::open(dbs.path().join("cancer.db")).unwrap();
        let mut stmt = conn.prepare("PRAGMA table_info(cancer_prediction)").unwrap();
        let types: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(types[0], ("id".to_string(), "INTEGER".to_string()));
        assert_eq!(types[1], ("radius_mean".to_string(), "REAL".to_string()));
        assert_eq!(types[2], ("diagnosis".to_string(), "TEXT".to_string()));
    }

    #[test]
    fn test_load_dataset_empty_cells_are_null() {
        let data = TempDir::new().unwrap();
        let dbs = TempDir::new().unwrap();
        write_csv(data.path(), "heart.csv", "Age,Thal\n63,fixed\n52,\n");
        let spec = DatasetSpec::new("heart.csv", "heart_disease.db", "heart_disease");
        load_dataset(data.path(), dbs.path(), &spec).unwrap();

        let conn = Connection::open(dbs.path().join("heart_disease.db")).unwrap();
        let nulls: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM heart_disease WHERE thal IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_load_all_isolates_missing_sibling() {
        let data = TempDir::new().unwrap();
        let dbs = TempDir::new().unwrap();
        // Only two of the three CSVs exist
        write_csv(data.path(), "heart.csv", "Age\n63\n");
        write_csv(data.path(), "diabetes.csv", "Glucose\n148\n");

        let outcomes = load_all(data.path(), dbs.path());
        assert_eq!(outcomes.len(), 3);

        let by_name: std::collections::HashMap<&str, &Result<LoadReport>> = outcomes
            .iter()
            .map(|(spec, outcome)| (spec.csv_file, outcome))
            .collect();

        assert!(by_name["heart.csv"].is_ok());
        assert!(by_name["diabetes.csv"].is_ok());
        assert!(matches!(
            by_name["cancer.csv"],
            Err(MedAgentError::DatasetNotFound(_))
        ));

        // The siblings landed despite the failure
        assert_eq!(table_rows(&dbs.path().join("heart_disease.db"), "heart_disease"), 1);
        assert_eq!(table_rows(&dbs.path().join("diabetes.db"), "diabetes"), 1);
    }

    #[test]
    fn test_builtin_specs() {
        let specs = DatasetSpec::builtin();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].table, "heart_disease");
        assert_eq!(specs[1].db_file, "cancer.db");
        assert_eq!(specs[2].csv_file, "diabetes.csv");
    }
}
