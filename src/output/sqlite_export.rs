//! SQLite export of the harvest collections
//!
//! Copies the success and failure collections into a SQLite database for
//! ad-hoc querying. The JSON files stay the source of truth; every export
//! replaces the tables' contents.

use crate::output::OutputResult;
use crate::record::{FailureRecord, ScrapedRecord};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the export database
pub const SCHEMA_SQL: &str = r#"
-- One row per extracted programme; record_json holds the full record
CREATE TABLE IF NOT EXISTS programmes (
    link TEXT PRIMARY KEY,
    name TEXT,
    description TEXT,
    degree TEXT,
    program TEXT,
    standard_period_of_study TEXT,
    location TEXT,
    study_type TEXT,
    admission_semester TEXT,
    annotation TEXT,
    admission_modus TEXT,
    tuition_fees_link TEXT,
    tuition_fees_info TEXT,
    university_name TEXT,
    university_website TEXT,
    scraped_at TEXT NOT NULL,
    record_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_programmes_degree ON programmes(degree);
CREATE INDEX IF NOT EXISTS idx_programmes_university ON programmes(university_name);

-- URLs whose last attempt failed
CREATE TABLE IF NOT EXISTS failures (
    url TEXT PRIMARY KEY,
    error TEXT NOT NULL
);
"#;

/// Rows written by one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportCounts {
    pub programmes: usize,
    pub failures: usize,
}

/// Initializes the export schema
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Exports both collections into the database at `path`
///
/// # Arguments
///
/// * `path` - SQLite file to create or update
/// * `successes` - The success collection
/// * `failures` - The failure collection
///
/// # Returns
///
/// * `Ok(ExportCounts)` - Rows written to each table
/// * `Err(OutputError)` - The database could not be written
pub fn export_sqlite(
    path: &Path,
    successes: &[ScrapedRecord],
    failures: &[FailureRecord],
) -> OutputResult<ExportCounts> {
    let mut conn = Connection::open(path)?;
    export_into(&mut conn, successes, failures)
}

fn export_into(
    conn: &mut Connection,
    successes: &[ScrapedRecord],
    failures: &[FailureRecord],
) -> OutputResult<ExportCounts> {
    initialize_schema(conn)?;

    let tx = conn.transaction()?;
    let mut counts = ExportCounts::default();

    tx.execute("DELETE FROM programmes", [])?;
    tx.execute("DELETE FROM failures", [])?;

    {
        let mut insert = tx.prepare(
            "INSERT OR REPLACE INTO programmes (
                link, name, description, degree, program, standard_period_of_study,
                location, study_type, admission_semester, annotation, admission_modus,
                tuition_fees_link, tuition_fees_info, university_name, university_website,
                scraped_at, record_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )?;

        for record in successes {
            let Some(link) = record.key() else {
                tracing::debug!("Skipping programme without link in export");
                continue;
            };
            let d = &record.detail;
            let json = serde_json::to_string(record)?;

            insert.execute(params![
                link,
                d.name,
                d.description,
                d.degree,
                d.program,
                d.standard_period_of_study,
                d.location,
                d.study_type,
                d.admission_semester,
                d.annotation,
                d.admission_modus,
                d.tuition_fees_link,
                d.tuition_fees_info,
                d.university_name,
                d.university_website,
                record.scraped_at,
                json,
            ])?;
            counts.programmes += 1;
        }

        let mut insert =
            tx.prepare("INSERT OR REPLACE INTO failures (url, error) VALUES (?1, ?2)")?;
        for failure in failures {
            insert.execute(params![failure.url, failure.error])?;
            counts.failures += 1;
        }
    }

    tx.commit()?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DetailRecord;

    fn programme(link: &str, degree: &str) -> ScrapedRecord {
        let mut detail = DetailRecord::for_link(link);
        detail.degree = Some(degree.to_string());
        ScrapedRecord {
            detail,
            scraped_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_export_writes_both_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        let successes = vec![
            programme("https://d.test/a", "Master"),
            programme("https://d.test/b", "Bachelor"),
        ];
        let failures = vec![FailureRecord {
            url: "https://d.test/c".to_string(),
            error: "Timeout".to_string(),
        }];

        let counts = export_into(&mut conn, &successes, &failures).unwrap();

        assert_eq!(counts, ExportCounts { programmes: 2, failures: 1 });
        let degree: String = conn
            .query_row(
                "SELECT degree FROM programmes WHERE link = ?1",
                params!["https://d.test/b"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(degree, "Bachelor");
    }

    #[test]
    fn test_export_replaces_previous_contents() {
        let mut conn = Connection::open_in_memory().unwrap();
        export_into(&mut conn, &[programme("https://d.test/a", "Master")], &[]).unwrap();
        export_into(&mut conn, &[programme("https://d.test/b", "Master")], &[]).unwrap();

        assert_eq!(count(&conn, "programmes"), 1);
        assert_eq!(count(&conn, "failures"), 0);
    }

    #[test]
    fn test_record_json_round_trips() {
        let mut conn = Connection::open_in_memory().unwrap();
        let original = programme("https://d.test/a", "Master");
        export_into(&mut conn, &[original.clone()], &[]).unwrap();

        let json: String = conn
            .query_row("SELECT record_json FROM programmes", [], |row| row.get(0))
            .unwrap();
        let back: ScrapedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
