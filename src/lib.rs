//! Photo-library maintenance: move perceptual duplicates out of a folder and
//! bulk-rename files under a naming policy.

pub mod batch;
pub mod dedup;
pub mod rename;

pub use batch::{BatchReport, ItemOutcome, ItemResult};
pub use dedup::{DedupError, DedupOutcome, run_dedup};
pub use rename::policy::RenamePolicy;
pub use rename::{RenameEngine, RenameError, RenameOutcome, run_rename};
