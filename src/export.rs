//! CSV export of stress logs and anxiety test results.
//!
//! Column orders are fixed and documented here; downstream spreadsheets
//! rely on them:
//!
//! * stress logs: `id,user_id,date,stress_level,sleep_hours,physical_activity,notes,created_at`
//! * anxiety results: `id,user_id,taken_at,q1,q2,q3,q4,q5,q6,q7,score,severity`
//!
//! Fields containing commas, quotes, or newlines are quoted per RFC 4180.
//! Optional fields render as empty cells. The read side runs under a short
//! retry so a transiently locked database does not fail the export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::repository::{
    AnxietyResultFilter, AnxietyResultRepository, Repository, StressLogFilter, StressLogRepository,
};
use crate::retry::{with_retry, RetryConfig};
use crate::scoring::Severity;

const STRESS_HEADER: &str = "id,user_id,date,stress_level,sleep_hours,physical_activity,notes,created_at";
const ANXIETY_HEADER: &str = "id,user_id,taken_at,q1,q2,q3,q4,q5,q6,q7,score,severity";

/// Quote a field if it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt_field<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Render stress logs matching `filter` as a CSV document (header included).
pub fn stress_logs_csv(repo: &StressLogRepository, filter: &StressLogFilter) -> Result<String> {
    let logs = with_retry(&RetryConfig::read_once(), "export_stress_logs", || {
        repo.list(filter)
    })?;

    let mut out = String::from(STRESS_HEADER);
    out.push('\n');
    for log in &logs {
        let row = [
            log.id.to_string(),
            log.user_id.to_string(),
            csv_field(&log.date),
            log.stress_level.to_string(),
            opt_field(&log.sleep_hours),
            opt_field(&log.physical_activity),
            csv_field(log.notes.as_deref().unwrap_or("")),
            csv_field(&log.created_at),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    info!(rows = logs.len(), "Exported stress logs to CSV");
    Ok(out)
}

/// Render anxiety results matching `filter` as a CSV document. Answers are
/// split into one column per question; severity is derived from the score.
pub fn anxiety_results_csv(
    repo: &AnxietyResultRepository,
    filter: &AnxietyResultFilter,
) -> Result<String> {
    let results = with_retry(&RetryConfig::read_once(), "export_anxiety_results", || {
        repo.list(filter)
    })?;

    let mut out = String::from(ANXIETY_HEADER);
    out.push('\n');
    for result in &results {
        let mut row = vec![
            result.id.to_string(),
            result.user_id.to_string(),
            csv_field(&result.taken_at),
        ];
        row.extend(result.answers.iter().map(|a| a.to_string()));
        row.push(result.score.to_string());
        row.push(Severity::for_score(result.score).as_str().to_string());
        out.push_str(&row.join(","));
        out.push('\n');
    }

    info!(rows = results.len(), "Exported anxiety results to CSV");
    Ok(out)
}

/// Write a rendered CSV document to `path`.
pub fn write_csv(path: &Path, contents: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    info!(path = %path.display(), bytes = contents.len(), "CSV written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{NewAnxietyTestResult, NewStressLog, NewUser, Role};
    use crate::repository::UserRepository;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().expect("db");
        let user_id = UserRepository::new(db.clone())
            .create(&NewUser {
                username: "alice".to_string(),
                password_hash: "h".to_string(),
                email: None,
                role: Role::User,
            })
            .expect("user");
        (db, user_id)
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_stress_export_columns_and_optionals() {
        let (db, user_id) = setup();
        let repo = StressLogRepository::new(db);
        repo.create(&NewStressLog {
            user_id,
            date: "2026-08-01".to_string(),
            stress_level: 7,
            notes: Some("late shift, poor sleep".to_string()),
            sleep_hours: None,
            physical_activity: Some(30),
        })
        .expect("create");

        let csv = stress_logs_csv(&repo, &StressLogFilter::default()).expect("export");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(STRESS_HEADER));

        let row = lines.next().expect("data row");
        let cells: Vec<&str> = row.splitn(8, ',').collect();
        assert_eq!(cells[2], "2026-08-01");
        assert_eq!(cells[3], "7");
        // Absent sleep_hours is an empty cell, not a literal null.
        assert_eq!(cells[4], "");
        assert_eq!(cells[5], "30");
        // The notes contain a comma, so the field is quoted.
        assert!(row.contains("\"late shift, poor sleep\""));
    }

    #[test]
    fn test_anxiety_export_has_per_question_columns() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db);
        repo.create(&NewAnxietyTestResult {
            user_id,
            answers: vec![0, 1, 2, 3, 2, 1, 0],
        })
        .expect("create");

        let csv = anxiety_results_csv(&repo, &AnxietyResultFilter::default()).expect("export");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(ANXIETY_HEADER));

        let cells: Vec<&str> = lines.next().expect("data row").split(',').collect();
        assert_eq!(cells.len(), 12);
        assert_eq!(&cells[3..10], ["0", "1", "2", "3", "2", "1", "0"]);
        assert_eq!(cells[10], "9");
        assert_eq!(cells[11], "mild");
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let (db, _) = setup();
        let repo = StressLogRepository::new(db);

        let csv = stress_logs_csv(&repo, &StressLogFilter::default()).expect("export");
        assert_eq!(csv, format!("{}\n", STRESS_HEADER));
    }

    #[test]
    fn test_write_csv_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");

        write_csv(&path, "a,b\n1,2\n").expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "a,b\n1,2\n");
    }
}
