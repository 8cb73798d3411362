//! Duplicate photo detection: fingerprint, group, relocate, report.

pub mod fingerprint;
pub mod relocate;
pub mod report;
pub mod scanner;

use crate::batch::BatchReport;
use report::{DuplicateReport, REPORT_FILE_NAME};
use scanner::{DuplicateScanner, ScanError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Укажите путь к папке с фотографиями!")]
    EmptySource,

    #[error("Укажите путь к папке для дубликатов!")]
    EmptyDestination,

    #[error("Папка '{path}' не существует!")]
    SourceMissing { path: PathBuf },

    #[error("Папка для дубликатов совпадает с папкой с фотографиями: '{path}'")]
    SameDirectory { path: PathBuf },

    #[error("Произошла ошибка при поиске дубликатов: {0}")]
    Scan(#[from] ScanError),

    #[error("Не удалось записать отчёт {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
pub struct DedupOutcome {
    pub report_path: PathBuf,
    pub groups_with_duplicates: usize,
    pub moved: usize,
    pub batch: BatchReport,
    #[serde(skip)]
    pub report: DuplicateReport,
}

/// Check the caller's inputs. Nothing on disk is touched.
pub fn validate_inputs(source_dir: &str, dest_dir: &str) -> Result<(PathBuf, PathBuf), DedupError> {
    let source_dir = source_dir.trim();
    let dest_dir = dest_dir.trim();

    if source_dir.is_empty() {
        return Err(DedupError::EmptySource);
    }
    if dest_dir.is_empty() {
        return Err(DedupError::EmptyDestination);
    }

    let source = PathBuf::from(source_dir);
    let dest = PathBuf::from(dest_dir);
    if !source.exists() {
        return Err(DedupError::SourceMissing { path: source });
    }
    if same_directory(&source, &dest) {
        return Err(DedupError::SameDirectory { path: source });
    }

    Ok((source, dest))
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Find duplicates in `source_dir`, move them into `dest_dir` and write
/// `<dest_dir>/duplicates.txt`.
///
/// A scan error aborts before the report is written.
pub fn run_dedup(source_dir: &str, dest_dir: &str) -> Result<DedupOutcome, DedupError> {
    let (source, dest) = validate_inputs(source_dir, dest_dir)?;
    dedup_with(DuplicateScanner::new(source, dest))
}

/// Run a preconfigured scanner, then write the report into its destination.
pub fn dedup_with(scanner: DuplicateScanner) -> Result<DedupOutcome, DedupError> {
    let outcome = scanner.scan()?;
    let dest = scanner.dest();
    let moved = outcome.moved_count();

    let report = DuplicateReport::new(outcome.groups);
    report.print();
    let report_path = report
        .write_to(dest)
        .map_err(|source| DedupError::WriteReport {
            path: dest.join(REPORT_FILE_NAME),
            source,
        })?;
    println!("Отчёт сохранён в файле: {}", report_path.display());

    Ok(DedupOutcome {
        report_path,
        groups_with_duplicates: report.duplicate_groups().count(),
        moved,
        batch: outcome.batch,
        report,
    })
}
