//! Loader pipeline integration tests
//!
//! Exercises the CSV-to-SQLite path end to end: loading, header
//! normalization, replace semantics, and the read-only registry on top.

use medagent::db::DbRegistry;
use medagent::error::MedAgentError;
use medagent::loader::{self, DatasetSpec};
use std::fs;
use tempfile::TempDir;

fn write_all_csvs(data: &TempDir) {
    fs::write(
        data.path().join("heart.csv"),
        "Age, Sex, Chest Pain\n63,1,3\n37,1,2\n41,0,1\n56,1,1\n",
    )
    .unwrap();
    fs::write(
        data.path().join("cancer.csv"),
        "Id,Radius Mean,Diagnosis\n1,17.99,M\n2,20.57,B\n3,19.69,M\n",
    )
    .unwrap();
    fs::write(
        data.path().join("diabetes.csv"),
        "Pregnancies,Glucose,Outcome\n6,148,1\n1,85,0\n",
    )
    .unwrap();
}

#[test]
fn test_load_all_row_counts_match_sources() {
    let data = TempDir::new().unwrap();
    let dbs = TempDir::new().unwrap();
    write_all_csvs(&data);

    let outcomes = loader::load_all(data.path(), dbs.path());
    let rows: Vec<usize> = outcomes
        .iter()
        .map(|(_, outcome)| outcome.as_ref().unwrap().rows)
        .collect();
    assert_eq!(rows, vec![4, 3, 2]);
}

#[test]
fn test_headers_are_normalized_everywhere() {
    let data = TempDir::new().unwrap();
    let dbs = TempDir::new().unwrap();
    write_all_csvs(&data);

    for (_, outcome) in loader::load_all(data.path(), dbs.path()) {
        let report = outcome.unwrap();
        for column in &report.columns {
            assert_eq!(column, &column.to_lowercase());
            assert!(!column.contains(' '), "column '{}' contains a space", column);
        }
    }
}

#[test]
fn test_spec_scenario_chest_pain_column() {
    let data = TempDir::new().unwrap();
    let dbs = TempDir::new().unwrap();
    write_all_csvs(&data);

    let spec = DatasetSpec::new("heart.csv", "heart_disease.db", "heart_disease");
    let report = loader::load_dataset(data.path(), dbs.path(), &spec).unwrap();
    assert_eq!(report.columns, vec!["age", "sex", "chest_pain"]);
}

#[test]
fn test_reload_is_idempotent() {
    let data = TempDir::new().unwrap();
    let dbs = TempDir::new().unwrap();
    write_all_csvs(&data);

    let first: Vec<usize> = loader::load_all(data.path(), dbs.path())
        .into_iter()
        .map(|(_, outcome)| outcome.unwrap().rows)
        .collect();
    let second: Vec<usize> = loader::load_all(data.path(), dbs.path())
        .into_iter()
        .map(|(_, outcome)| outcome.unwrap().rows)
        .collect();
    assert_eq!(first, second);

    // Content, not just counts: the same query gives the same text
    let registry = DbRegistry::open(dbs.path()).unwrap();
    let text = registry
        .heart()
        .execute_query("SELECT age, sex, chest_pain FROM heart_disease ORDER BY age")
        .unwrap();
    assert!(text.starts_with("age | sex | chest_pain"));
    assert!(text.contains("37 | 1 | 2"));
}

#[test]
fn test_registry_query_through_full_pipeline() {
    let data = TempDir::new().unwrap();
    let dbs = TempDir::new().unwrap();
    write_all_csvs(&data);
    for (_, outcome) in loader::load_all(data.path(), dbs.path()) {
        outcome.unwrap();
    }

    let registry = DbRegistry::open(dbs.path()).unwrap();

    let text = registry
        .cancer()
        .execute_query("SELECT COUNT(*) AS malignant FROM cancer_prediction WHERE diagnosis = 'M'")
        .unwrap();
    assert!(text.contains("malignant"));
    assert!(text.contains('2'));

    // Malformed queries are textual errors at the db layer, never aborts
    assert!(registry.cancer().execute_query("SELECT * FROM missing_table").is_err());
}

#[test]
fn test_missing_dataset_does_not_block_siblings() {
    let data = TempDir::new().unwrap();
    let dbs = TempDir::new().unwrap();
    fs::write(data.path().join("heart.csv"), "Age\n63\n").unwrap();
    fs::write(data.path().join("cancer.csv"), "Id\n1\n").unwrap();
    // diabetes.csv intentionally absent

    let outcomes = loader::load_all(data.path(), dbs.path());
    assert!(outcomes[0].1.is_ok());
    assert!(outcomes[1].1.is_ok());
    assert!(matches!(
        outcomes[2].1,
        Err(MedAgentError::DatasetNotFound(_))
    ));
}
