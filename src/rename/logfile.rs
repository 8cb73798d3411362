use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the rename log written into the renamed directory.
pub const RENAME_LOG_FILE_NAME: &str = "rename.txt";

const LOG_HEADER: &str = "Лог переименования файлов:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameEntry {
    pub old_name: String,
    pub new_name: String,
}

impl std::fmt::Display for RenameEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.old_name, self.new_name)
    }
}

/// Renames of one batch, in processing order. Written once, at the end.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameLog {
    pub entries: Vec<RenameEntry>,
}

impl RenameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, old_name: impl Into<String>, new_name: impl Into<String>) {
        self.entries.push(RenameEntry {
            old_name: old_name.into(),
            new_name: new_name.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        let lines: Vec<String> = self.entries.iter().map(ToString::to_string).collect();
        format!("{}\n\n{}", LOG_HEADER, lines.join("\n"))
    }

    /// Overwrite `<dir>/rename.txt`.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(RENAME_LOG_FILE_NAME);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}
