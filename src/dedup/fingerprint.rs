use image::ImageReader;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Extensions (lowercase, without the dot) the scanner will try to decode.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Perceptual fingerprint of an image. Equal fingerprints mean duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Box<[u8]>);

impl Fingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Returns true when the file name ends in `.<ext>` for one of
/// [`SUPPORTED_EXTENSIONS`], compared case-insensitively. A bare `.png` counts.
pub fn is_supported_image(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| name.strip_suffix(ext).is_some_and(|rest| rest.ends_with('.')))
}

/// DCT-based perceptual hasher (64-bit pHash).
pub struct FingerprintService {
    hasher: Hasher,
}

impl FingerprintService {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(8, 8)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }

    /// Decode `path` by content and hash its pixels.
    pub fn compute(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let hash = self.hasher.hash_image(&img);
        Ok(Fingerprint::from_bytes(hash.as_bytes()))
    }
}

impl Default for FingerprintService {
    fn default() -> Self {
        Self::new()
    }
}
