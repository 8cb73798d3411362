use crate::batch::BatchReport;
use crate::dedup::fingerprint::{Fingerprint, FingerprintError, FingerprintService, is_supported_image};
use crate::dedup::relocate::relocate;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use walkdir::WalkDir;

/// `None` when the file was not hashed because the scan was cancelled.
type FingerprintResult = Option<Result<Fingerprint, FingerprintError>>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Путь '{path}' не является папкой!")]
    NotADirectory { path: PathBuf },

    #[error("Не удалось создать папку {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Не удалось прочитать папку: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Операция отменена")]
    Cancelled,
}

/// Paths sharing one fingerprint. The first member is the original, which
/// stays in the source directory; every later member has been relocated.
/// A group always has at least one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub(crate) fingerprint: Fingerprint,
    pub(crate) members: Vec<PathBuf>,
}

impl DuplicateGroup {
    fn new(fingerprint: Fingerprint, original: PathBuf) -> Self {
        Self {
            fingerprint,
            members: vec![original],
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn members(&self) -> &[PathBuf] {
        &self.members
    }

    pub fn original(&self) -> &Path {
        &self.members[0]
    }

    pub fn duplicates(&self) -> &[PathBuf] {
        self.members.get(1..).unwrap_or_default()
    }

    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every group, singletons included, in first-seen order.
    pub groups: Vec<DuplicateGroup>,
    pub batch: BatchReport,
}

impl ScanOutcome {
    pub fn moved_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }
}

/// Finds visually identical images in one directory and moves every copy
/// after the first into a destination directory.
///
/// The directory is read non-recursively in whatever order the host file
/// system lists it. That order decides which of several identical files is
/// treated as the original, so the choice is platform dependent.
pub struct DuplicateScanner {
    source: PathBuf,
    dest: PathBuf,
    fingerprints: FingerprintService,
    progress: ProgressBar,
    cancellation_token: Arc<AtomicBool>,
}

impl DuplicateScanner {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            fingerprints: FingerprintService::new(),
            progress: ProgressBar::hidden(),
            cancellation_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn get_cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancellation_token.clone()
    }

    /// Directory that receives the duplicates.
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token.load(Ordering::Relaxed)
    }

    pub fn scan(&self) -> Result<ScanOutcome, ScanError> {
        if !self.dest.exists() {
            fs::create_dir_all(&self.dest).map_err(|source| ScanError::CreateDestination {
                path: self.dest.clone(),
                source,
            })?;
        }

        let candidates = self.discover_images()?;
        log::info!(
            "Fingerprinting {} image(s) in {}",
            candidates.len(),
            self.source.display()
        );

        let fingerprints = self.fingerprint_all(&candidates);
        if self.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        self.group_and_relocate(candidates.iter().zip(fingerprints))
    }

    /// Group fingerprinted files in the given order and relocate every file
    /// whose fingerprint was already seen.
    fn group_and_relocate<'a>(
        &self,
        fingerprinted: impl IntoIterator<Item = (&'a PathBuf, FingerprintResult)>,
    ) -> Result<ScanOutcome, ScanError> {
        let mut outcome = ScanOutcome::default();
        let mut index_by_fp: HashMap<Fingerprint, usize> = HashMap::new();

        // Grouping and moves stay sequential so listing order decides the original.
        for (path, result) in fingerprinted {
            let fingerprint = match result {
                Some(Ok(fp)) => fp,
                Some(Err(e)) => {
                    println!("Файл {} не является изображением или поврежден.", path.display());
                    log::warn!("Failed to fingerprint {}: {}", path.display(), e);
                    outcome.batch.skipped(path, e);
                    continue;
                }
                None => return Err(ScanError::Cancelled),
            };

            match index_by_fp.get(&fingerprint).copied() {
                None => {
                    index_by_fp.insert(fingerprint.clone(), outcome.groups.len());
                    outcome.groups.push(DuplicateGroup::new(fingerprint, path.clone()));
                    outcome.batch.succeeded(path);
                }
                Some(idx) => {
                    if self.is_cancelled() {
                        return Err(ScanError::Cancelled);
                    }
                    match relocate(path, &self.dest) {
                        Ok(moved_to) => {
                            log::debug!("Moved {} → {}", path.display(), moved_to.display());
                            outcome.groups[idx].members.push(path.clone());
                            outcome.batch.succeeded(path);
                        }
                        Err(e) => {
                            eprintln!("Ошибка: {}", e);
                            log::warn!("Failed to relocate {}: {}", path.display(), e);
                            outcome.batch.failed(path, e);
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Supported image files directly inside the source, in listing order.
    fn discover_images(&self) -> Result<Vec<PathBuf>, ScanError> {
        if !self.source.is_dir() {
            return Err(ScanError::NotADirectory {
                path: self.source.clone(),
            });
        }

        let mut images = Vec::new();
        for entry in WalkDir::new(&self.source).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_supported_image(path) {
                images.push(path.to_path_buf());
            }
        }
        Ok(images)
    }

    /// Decode and hash every candidate on the rayon pool. Results come back in
    /// the same order as `paths`; `None` marks files skipped after cancellation.
    fn fingerprint_all(
        &self,
        paths: &[PathBuf],
    ) -> Vec<FingerprintResult> {
        self.progress.set_length(paths.len() as u64);

        let results: Vec<_> = paths
            .par_iter()
            .map(|path| {
                if self.is_cancelled() {
                    return None;
                }
                let result = self.fingerprints.compute(path);
                self.progress.inc(1);
                Some(result)
            })
            .collect();

        self.progress.finish_and_clear();
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::fingerprint::tests::{Pattern, create_test_image};
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_non_image_files_produce_no_groups() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("notes.txt"), b"hello").unwrap();
        fs::write(src.path().join("data.csv"), b"1,2,3").unwrap();

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert!(outcome.groups.is_empty());
        assert!(outcome.batch.items.is_empty());
        assert_eq!(entries(src.path()), vec!["data.csv", "notes.txt"]);
        assert!(entries(dst.path()).is_empty());
    }

    #[test]
    fn test_identical_images_move_all_but_first() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for name in ["a.png", "b.png", "c.png", "d.bmp"] {
            create_test_image(&src.path().join(name), Pattern::Horizontal);
        }

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.members.len(), 4);
        assert_eq!(group.duplicate_count(), 3);
        assert_eq!(outcome.moved_count(), 3);

        assert!(group.original().exists());
        assert_eq!(entries(src.path()).len(), 1);
        assert_eq!(entries(dst.path()).len(), 3);
        for dup in group.duplicates() {
            assert!(!dup.exists());
            assert!(dst.path().join(dup.file_name().unwrap()).exists());
        }
    }

    #[test]
    fn test_distinct_images_form_singletons() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_image(&src.path().join("h1.png"), Pattern::Horizontal);
        create_test_image(&src.path().join("h2.png"), Pattern::Horizontal);
        create_test_image(&src.path().join("v.png"), Pattern::Vertical);
        create_test_image(&src.path().join("c.png"), Pattern::Corner);

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert_eq!(outcome.groups.len(), 3);
        let sizes: Vec<usize> = outcome.groups.iter().map(|g| g.members.len()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 4);
        assert_eq!(sizes.iter().filter(|&&n| n == 2).count(), 1);
        assert_eq!(entries(dst.path()).len(), 1);
    }

    #[test]
    fn test_unsupported_extensions_are_ignored() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_image(&src.path().join("a.png"), Pattern::Vertical);
        // Same pixels, but the extension is not in the supported set.
        create_test_image(&src.path().join("b.png"), Pattern::Vertical);
        fs::rename(src.path().join("b.png"), src.path().join("b.txt")).unwrap();

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert_eq!(outcome.groups.len(), 1);
        assert!(!outcome.groups[0].has_duplicates());
        assert!(src.path().join("b.txt").exists());
        assert!(entries(dst.path()).is_empty());
    }

    #[test]
    fn test_corrupt_image_is_skipped_and_left_in_place() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_image(&src.path().join("good.png"), Pattern::Corner);
        fs::write(src.path().join("broken.jpg"), b"garbage").unwrap();

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.batch.skipped_count(), 1);
        assert_eq!(outcome.batch.succeeded_count(), 1);
        assert!(src.path().join("broken.jpg").exists());
    }

    #[test]
    fn test_creates_missing_destination() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let nested = dst.path().join("a").join("b");

        DuplicateScanner::new(src.path(), &nested).scan().unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn test_subdirectories_are_not_scanned() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sub = src.path().join("nested.png");
        fs::create_dir(&sub).unwrap();
        create_test_image(&sub.join("x.png"), Pattern::Horizontal);
        create_test_image(&src.path().join("x.png"), Pattern::Horizontal);

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert_eq!(outcome.groups.len(), 1);
        assert!(!outcome.groups[0].has_duplicates());
        assert!(sub.join("x.png").exists());
    }

    #[test]
    fn test_move_failure_is_recorded_and_scan_continues() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_image(&src.path().join("a.png"), Pattern::Horizontal);
        create_test_image(&src.path().join("b.png"), Pattern::Horizontal);
        create_test_image(&src.path().join("c.png"), Pattern::Horizontal);
        // Occupy every possible destination name; only the moves collide.
        for name in ["a.png", "b.png", "c.png"] {
            fs::write(dst.path().join(name), b"occupied").unwrap();
        }

        let outcome = DuplicateScanner::new(src.path(), dst.path()).scan().unwrap();

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].members.len(), 1);
        assert_eq!(outcome.batch.failed_count(), 2);
        assert_eq!(entries(src.path()).len(), 3);
    }

    #[test]
    fn test_cancelled_before_start_moves_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_image(&src.path().join("a.png"), Pattern::Horizontal);
        create_test_image(&src.path().join("b.png"), Pattern::Horizontal);

        let scanner = DuplicateScanner::new(src.path(), dst.path());
        scanner.get_cancellation_token().store(true, Ordering::Relaxed);
        let result = scanner.scan();

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(entries(src.path()).len(), 2);
    }

    #[test]
    fn test_cancel_between_moves_keeps_completed_moves() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            create_test_image(&src.path().join(name), Pattern::Horizontal);
        }

        let scanner = DuplicateScanner::new(src.path(), dst.path());
        let candidates = scanner.discover_images().unwrap();
        let fingerprints = scanner.fingerprint_all(&candidates);
        let token = scanner.get_cancellation_token();
        // Pulling the third file means the second one has already been moved.
        let fingerprinted = candidates
            .iter()
            .zip(fingerprints)
            .enumerate()
            .map(|(i, item)| {
                if i == 2 {
                    token.store(true, Ordering::Relaxed);
                }
                item
            });

        let result = scanner.group_and_relocate(fingerprinted);

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(entries(dst.path()).len(), 1);
        assert_eq!(entries(src.path()).len(), 2);
    }

    #[test]
    fn test_group_accessors() {
        let group = DuplicateGroup::new(Fingerprint::from_bytes(&[1; 8]), PathBuf::from("a.png"));

        assert_eq!(group.fingerprint(), &Fingerprint::from_bytes(&[1; 8]));
        assert_eq!(group.members(), &[PathBuf::from("a.png")]);
        assert_eq!(group.original(), Path::new("a.png"));
        assert!(group.duplicates().is_empty());
        assert_eq!(group.duplicate_count(), 0);
        assert!(!group.has_duplicates());
    }

    #[test]
    fn test_source_that_is_a_file_is_rejected() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("photo.png");
        create_test_image(&file, Pattern::Horizontal);

        let result = DuplicateScanner::new(&file, dst.path()).scan();

        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }
}
