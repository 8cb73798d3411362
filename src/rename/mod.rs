//! Bulk renaming of the files in one directory.

pub mod logfile;
pub mod policy;

use crate::batch::BatchReport;
use logfile::{RENAME_LOG_FILE_NAME, RenameLog};
use policy::RenamePolicy;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use walkdir::WalkDir;

/// Attempts at drawing a random name that is free before giving up on a file.
const MAX_RANDOM_ATTEMPTS: usize = 32;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Укажите путь к папке для переименования!")]
    EmptyPath,

    #[error("Указанной папки не существует: '{path}'")]
    DirectoryMissing { path: PathBuf },

    #[error("Неверный выбор способа переименования: '{selector}'")]
    UnknownPolicy { selector: String },

    #[error("Базовое название не может быть пустым!")]
    EmptyBaseName,

    #[error("Недопустимое базовое название: '{base_name}'")]
    InvalidBaseName { base_name: String },

    #[error("Не удалось прочитать папку: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Не удалось записать лог {path}: {source}")]
    WriteLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
pub struct RenameOutcome {
    pub policy: RenamePolicy,
    pub log_path: PathBuf,
    pub log: RenameLog,
    pub batch: BatchReport,
}

/// Renames every regular file directly inside a directory, in file-name
/// order, under one [`RenamePolicy`].
pub struct RenameEngine {
    dir: PathBuf,
    policy: RenamePolicy,
    cancellation_token: Arc<AtomicBool>,
}

impl RenameEngine {
    pub fn new(dir: impl Into<PathBuf>, policy: RenamePolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
            cancellation_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_cancellation_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn get_cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancellation_token.clone()
    }

    pub fn policy(&self) -> &RenamePolicy {
        &self.policy
    }

    /// Rename the batch and write `rename.txt`.
    ///
    /// Individual failures are recorded in the batch report and do not stop
    /// the batch. Already renamed files are never rolled back.
    pub fn run(&self) -> Result<RenameOutcome, RenameError> {
        self.policy.validate()?;
        if !self.dir.is_dir() {
            return Err(RenameError::DirectoryMissing {
                path: self.dir.clone(),
            });
        }

        let files = self.list_files()?;
        log::info!("Renaming {} file(s) in {}", files.len(), self.dir.display());

        let mut rename_log = RenameLog::new();
        let mut batch = BatchReport::new();
        let mut used: HashSet<OsString> = HashSet::new();

        for (idx, path) in files.iter().enumerate() {
            if self.cancellation_token.load(Ordering::Relaxed) {
                batch.cancelled = true;
                break;
            }

            let Some(old_name) = path.file_name().map(|n| n.to_os_string()) else {
                batch.failed(path, "нет имени файла");
                continue;
            };
            let Some(new_name) = self.next_name(path, idx + 1, &used) else {
                batch.failed(path, "не удалось подобрать свободное имя");
                continue;
            };
            used.insert(new_name.clone());

            if new_name != old_name {
                let new_path = self.dir.join(&new_name);
                if new_path.exists() {
                    log::warn!("{} already exists, skipping {}", new_path.display(), path.display());
                    batch.skipped(
                        path,
                        format!("файл {} уже существует", new_name.to_string_lossy()),
                    );
                    continue;
                }
                if let Err(e) = fs::rename(path, &new_path) {
                    eprintln!("Ошибка: не удалось переименовать {}: {}", path.display(), e);
                    batch.failed(path, e);
                    continue;
                }
            }

            let old_name = old_name.to_string_lossy().into_owned();
            let new_name = new_name.to_string_lossy().into_owned();
            println!("{} -> {}", old_name, new_name);
            rename_log.push(old_name, new_name);
            batch.succeeded(path);
        }

        let log_path = rename_log
            .write_to(&self.dir)
            .map_err(|source| RenameError::WriteLog {
                path: self.dir.join(RENAME_LOG_FILE_NAME),
                source,
            })?;
        println!(
            "Переименование завершено! Лог сохранён в файле: {}",
            log_path.display()
        );

        Ok(RenameOutcome {
            policy: self.policy.clone(),
            log_path,
            log: rename_log,
            batch,
        })
    }

    /// Regular files directly inside the directory, sorted by file name. The
    /// rename log itself is left out.
    fn list_files(&self) -> Result<Vec<PathBuf>, RenameError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_name() == RENAME_LOG_FILE_NAME {
                continue;
            }
            if entry.path().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn next_name(&self, path: &Path, count: usize, used: &HashSet<OsString>) -> Option<OsString> {
        if !self.policy.is_random() {
            return Some(self.policy.new_name(path, count));
        }
        (0..MAX_RANDOM_ATTEMPTS)
            .map(|_| self.policy.new_name(path, count))
            .find(|name| !used.contains(name) && !self.dir.join(name).exists())
    }
}

/// Check the directory input. Nothing on disk is touched.
pub fn validate_dir(dir: &str) -> Result<PathBuf, RenameError> {
    let dir = dir.trim();
    if dir.is_empty() {
        return Err(RenameError::EmptyPath);
    }
    let path = PathBuf::from(dir);
    if !path.is_dir() {
        return Err(RenameError::DirectoryMissing { path });
    }
    Ok(path)
}

/// Rename every file in `dir` under the policy picked by `selector`
/// (`"1"` sequential, `"2"` random, `"3"` custom with `base_name`).
///
/// All inputs are validated before the first rename.
pub fn run_rename(
    dir: &str,
    selector: &str,
    base_name: Option<&str>,
) -> Result<RenameOutcome, RenameError> {
    let dir = validate_dir(dir)?;
    let policy = RenamePolicy::from_selector(selector, base_name)?;
    RenameEngine::new(dir, policy).run()
}
