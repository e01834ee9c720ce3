//! Report file naming and persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use report_core::TimeWindow;
use tracing::info;

use crate::error::OrchestratorError;

/// Directory reports are written to by default.
pub const DEFAULT_OUTPUT_DIR: &str = "outputs/reports";

/// File name for a report on `location` generated at `generated_at`.
///
/// `"Sanaa, Yemen"` at 2024-03-01 12:00:00 UTC becomes
/// `report_Sanaa_Yemen_20240301120000.txt`.
pub fn report_file_name(location: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "report_{}_{}.txt",
        location.replace(", ", "_"),
        generated_at.format("%Y%m%d%H%M%S")
    )
}

/// Write `report` under `dir`, creating the directory if needed.
///
/// Returns the path of the written file.
pub fn save_report(
    dir: &Path,
    location: &str,
    generated_at: DateTime<Utc>,
    report: &str,
) -> Result<PathBuf, OrchestratorError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(location, generated_at));
    fs::write(&path, report)?;
    info!("Report saved to {}", path.display());
    Ok(path)
}

/// Write a report stamped with the end of the window it covers.
pub fn save_window_report(
    dir: &Path,
    location: &str,
    window: &TimeWindow,
    report: &str,
) -> Result<PathBuf, OrchestratorError> {
    save_report(dir, location, window.end(), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            report_file_name("Sanaa, Yemen", at_noon()),
            "report_Sanaa_Yemen_20240301120000.txt"
        );
        assert_eq!(
            report_file_name("Yemen", at_noon()),
            "report_Yemen_20240301120000.txt"
        );
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = std::env::temp_dir()
            .join("orchestrator-save-report")
            .join("nested");
        let _ = fs::remove_dir_all(&dir);

        let path = save_report(&dir, "Sanaa, Yemen", at_noon(), "report body").unwrap();

        assert_eq!(path, dir.join("report_Sanaa_Yemen_20240301120000.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "report body");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_window_report_named_after_window_end() {
        let dir = std::env::temp_dir().join("orchestrator-save-window-report");
        let _ = fs::remove_dir_all(&dir);

        let window = TimeWindow::ending_at(at_noon(), 6).unwrap();
        let path = save_window_report(&dir, "Tehran, Iran", &window, "body").unwrap();

        assert_eq!(path, dir.join("report_Tehran_Iran_20240301120000.txt"));

        let _ = fs::remove_dir_all(&dir);
    }
}
