use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("У файла {path} нет имени")]
    MissingFileName { path: PathBuf },

    #[error("Файл {path} уже существует в папке для дубликатов")]
    DestinationExists { path: PathBuf },

    #[error("Не удалось переместить {from} → {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Move `file` into `dest_dir`, keeping its file name.
///
/// Never overwrites an existing file. Falls back to copy + remove when the
/// two directories live on different filesystems.
pub fn relocate(file: &Path, dest_dir: &Path) -> Result<PathBuf, RelocateError> {
    let file_name = file.file_name().ok_or_else(|| RelocateError::MissingFileName {
        path: file.to_path_buf(),
    })?;
    let dest = dest_dir.join(file_name);

    if dest.exists() {
        return Err(RelocateError::DestinationExists { path: dest });
    }

    let io_err = |source: io::Error| RelocateError::Io {
        from: file.to_path_buf(),
        to: dest.clone(),
        source,
    };

    match fs::rename(file, &dest) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("{} crosses devices, copying instead", file.display());
            fs::copy(file, &dest).map_err(io_err)?;
            if let Err(e) = fs::remove_file(file) {
                let _ = fs::remove_file(&dest);
                return Err(io_err(e));
            }
        }
        Err(e) => return Err(io_err(e)),
    }

    Ok(dest)
}
