use std::{collections::HashSet, fs, path::{Path, PathBuf}};

use rusqlite::Connection;
use tracing::debug;

use crate::{error::FinishError, plan::MigrationPlan};

/// Result of running the schema script and re-reading the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub path: PathBuf,
    pub present: Vec<String>,
    pub missing: Vec<String>,
    /// `(table, column)` pairs expected by the plan but absent from an
    /// existing table.
    pub missing_columns: Vec<(String, String)>,
}

impl SchemaReport {
    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Create the database file if needed and ensure every table of the plan exists.
pub fn bootstrap_schema<P: AsRef<Path>>(
    path: P,
    plan: &MigrationPlan,
) -> Result<SchemaReport, FinishError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| FinishError::io(dir, e))?;
    }

    let mut conn = Connection::open(path)?;
    debug!(db = %path.display(), "executing schema batch");
    let tx = conn.transaction()?;
    tx.execute_batch(&plan.schema)?;
    tx.commit()?;

    let existing = table_names(&conn)?;
    let mut report = SchemaReport {
        path: path.to_path_buf(),
        present: Vec::new(),
        missing: Vec::new(),
        missing_columns: Vec::new(),
    };
    for table in &plan.tables {
        if !existing.contains(&table.name) {
            report.missing.push(table.name.clone());
            continue;
        }
        report.present.push(table.name.clone());
        let columns = column_names(&conn, &table.name)?;
        for column in &table.columns {
            if !columns.contains(column) {
                report
                    .missing_columns
                    .push((table.name.clone(), column.clone()));
            }
        }
    }
    Ok(report)
}

fn table_names(conn: &Connection) -> Result<HashSet<String>, FinishError> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

fn column_names(conn: &Connection, table: &str) -> Result<HashSet<String>, FinishError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_dirs_and_tables() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("database").join("docucortex.db");
        let report = bootstrap_schema(&db, &MigrationPlan::default()).unwrap();
        assert!(db.exists());
        assert!(report.all_present());
        assert_eq!(
            report.present,
            vec!["chat_channels", "chat_messages", "user_preferences"]
        );
        assert!(report.missing_columns.is_empty());
    }

    #[test]
    fn rerun_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("app.db");
        let plan = MigrationPlan::default();
        let first = bootstrap_schema(&db, &plan).unwrap();
        let second = bootstrap_schema(&db, &plan).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn existing_data_survives() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("app.db");
        let plan = MigrationPlan::default();
        bootstrap_schema(&db, &plan).unwrap();
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute(
                "INSERT INTO user_preferences (user_id, preferences) VALUES ('kevin', '{}')",
                [],
            )
            .unwrap();
        }
        bootstrap_schema(&db, &plan).unwrap();
        let conn = Connection::open(&db).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_preferences", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn drifted_table_reports_missing_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("app.db");
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute_batch("CREATE TABLE user_preferences (user_id TEXT PRIMARY KEY);")
                .unwrap();
        }
        let report = bootstrap_schema(&db, &MigrationPlan::default()).unwrap();
        assert!(report.all_present());
        assert_eq!(
            report.missing_columns,
            vec![
                ("user_preferences".to_string(), "preferences".to_string()),
                ("user_preferences".to_string(), "updated_at".to_string()),
            ]
        );
    }

    #[test]
    fn post_check_flags_table_the_script_did_not_create() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("app.db");
        let mut plan = MigrationPlan::default();
        plan.schema = "CREATE TABLE IF NOT EXISTS chat_channels (id INTEGER PRIMARY KEY);".into();
        let report = bootstrap_schema(&db, &plan).unwrap();
        assert!(!report.all_present());
        assert_eq!(report.missing, vec!["chat_messages", "user_preferences"]);
    }

    #[test]
    fn broken_script_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut plan = MigrationPlan::default();
        plan.schema = "CREATE TABLE oops (".into();
        let err = bootstrap_schema(tmp.path().join("app.db"), &plan).unwrap_err();
        assert!(matches!(err, FinishError::Sqlite(_)));
    }

    #[test]
    fn unopenable_path_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a database file
        let err = bootstrap_schema(tmp.path(), &MigrationPlan::default()).unwrap_err();
        assert!(matches!(err, FinishError::Sqlite(_)));
    }
}
