use crate::dedup::scanner::DuplicateGroup;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the report written into the destination directory.
pub const REPORT_FILE_NAME: &str = "duplicates.txt";

const REPORT_HEADER: &str = "Отчёт о найденных дубликатах:";
const NO_DUPLICATES: &str = "Дубликаты не найдены.";

/// Duplicate groups ranked by member count, largest first. Groups of equal
/// size keep their first-seen order.
#[derive(Debug, Clone)]
pub struct DuplicateReport {
    ranked: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn new(mut groups: Vec<DuplicateGroup>) -> Self {
        // sort_by is stable
        groups.sort_by(|a, b| b.members.len().cmp(&a.members.len()));
        Self { ranked: groups }
    }

    pub fn ranked(&self) -> &[DuplicateGroup] {
        &self.ranked
    }

    /// Ranked groups that actually have duplicates.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.ranked.iter().filter(|g| g.has_duplicates())
    }

    pub fn has_duplicates(&self) -> bool {
        self.duplicate_groups().next().is_some()
    }

    /// Contents of `duplicates.txt`.
    pub fn render(&self) -> String {
        if !self.has_duplicates() {
            return format!("{}\n", NO_DUPLICATES);
        }

        let mut out = format!("{}\n\n", REPORT_HEADER);
        for (idx, group) in self.duplicate_groups().enumerate() {
            out.push_str(&format!(
                "{}. Изображение с хэшем {} имеет {} дубликатов:\n",
                idx + 1,
                group.fingerprint,
                group.duplicate_count()
            ));
            for (file_idx, file) in group.members.iter().enumerate() {
                out.push_str(&format!("   {}. {}\n", file_idx + 1, file.display()));
            }
            out.push('\n');
        }
        out
    }

    /// Console rendition of the same information.
    pub fn print(&self) {
        if !self.has_duplicates() {
            println!("{}", NO_DUPLICATES);
            return;
        }

        println!("\nДубликаты изображений (отсортированы по количеству):");
        for group in self.duplicate_groups() {
            println!(
                "\nИзображение с хэшем {} имеет {} дубликатов:",
                group.fingerprint,
                group.duplicate_count()
            );
            for file in &group.members {
                println!("  - {}", file.display());
            }
        }
    }

    /// Overwrite `<dest_dir>/duplicates.txt` with [`render`](Self::render).
    pub fn write_to(&self, dest_dir: &Path) -> io::Result<PathBuf> {
        let path = dest_dir.join(REPORT_FILE_NAME);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}
