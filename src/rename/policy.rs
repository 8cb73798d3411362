use crate::rename::RenameError;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::ffi::OsString;
use std::path::Path;

/// Length of names produced by [`RenamePolicy::Randomized`].
pub const RANDOM_NAME_LEN: usize = 8;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// How each file in a batch gets its new name. The original extension is
/// always kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RenamePolicy {
    /// `1.jpg`, `2.jpg`, ...
    Sequential,
    /// Eight random ASCII letters, e.g. `qHxBzKta.jpg`.
    Randomized,
    /// `<base_name>_1.jpg`, `<base_name>_2.jpg`, ...
    Custom { base_name: String },
}

impl RenamePolicy {
    /// Parse the caller's three-way selection. `"1"`, `"2"` and `"3"` are
    /// accepted along with `sequential`, `random` and `custom`.
    pub fn from_selector(selector: &str, base_name: Option<&str>) -> Result<Self, RenameError> {
        match selector.trim().to_lowercase().as_str() {
            "1" | "sequential" => Ok(Self::Sequential),
            "2" | "random" | "randomized" => Ok(Self::Randomized),
            "3" | "custom" => Self::custom(base_name.unwrap_or_default()),
            _ => Err(RenameError::UnknownPolicy {
                selector: selector.to_string(),
            }),
        }
    }

    /// True when `selector` picks the custom policy, which needs a base name.
    pub fn selector_needs_base_name(selector: &str) -> bool {
        matches!(selector.trim().to_lowercase().as_str(), "3" | "custom")
    }

    pub fn custom(base_name: &str) -> Result<Self, RenameError> {
        let policy = Self::Custom {
            base_name: base_name.trim().to_string(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checked once before a batch starts so a bad base name renames nothing.
    pub fn validate(&self) -> Result<(), RenameError> {
        if let Self::Custom { base_name } = self {
            if base_name.trim().is_empty() {
                return Err(RenameError::EmptyBaseName);
            }
            if base_name == "."
                || base_name == ".."
                || base_name.contains(['/', '\\'])
            {
                return Err(RenameError::InvalidBaseName {
                    base_name: base_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// New file name for the file at `path`, which is number `count` (1-based)
    /// in the batch.
    pub fn new_name(&self, path: &Path, count: usize) -> OsString {
        let stem = match self {
            Self::Sequential => count.to_string(),
            Self::Randomized => random_name(RANDOM_NAME_LEN),
            Self::Custom { base_name } => format!("{}_{}", base_name, count),
        };
        with_extension_of(stem, path)
    }

    pub fn is_random(&self) -> bool {
        matches!(self, Self::Randomized)
    }
}

fn with_extension_of(stem: String, path: &Path) -> OsString {
    let mut name = OsString::from(stem);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// `len` letters drawn uniformly from `[A-Za-z]`.
pub fn random_name(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .filter_map(|_| LETTERS.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect()
}
