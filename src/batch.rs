use serde::Serialize;
use std::path::{Path, PathBuf};

/// What happened to a single file during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded,
    Skipped { reason: String },
    Failed { reason: String },
}

impl ItemOutcome {
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Succeeded => None,
            Self::Skipped { reason } | Self::Failed { reason } => Some(reason.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Per-item results of one batch, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<ItemResult>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeded(&mut self, path: &Path) {
        self.push(path, ItemOutcome::Succeeded);
    }

    pub fn skipped(&mut self, path: &Path, reason: impl ToString) {
        self.push(
            path,
            ItemOutcome::Skipped {
                reason: reason.to_string(),
            },
        );
    }

    pub fn failed(&mut self, path: &Path, reason: impl ToString) {
        self.push(
            path,
            ItemOutcome::Failed {
                reason: reason.to_string(),
            },
        );
    }

    fn push(&mut self, path: &Path, outcome: ItemOutcome) {
        self.items.push(ItemResult {
            path: path.to_path_buf(),
            outcome,
        });
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Succeeded))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }

    /// One-line summary for the console.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "Успешно: {}, пропущено: {}, ошибок: {}",
            self.succeeded_count(),
            self.skipped_count(),
            self.failed_count()
        );
        if self.cancelled {
            line.push_str(" (операция отменена)");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_outcome() {
        let mut report = BatchReport::new();
        report.succeeded(Path::new("a.png"));
        report.succeeded(Path::new("b.png"));
        report.skipped(Path::new("c.png"), "corrupt");
        report.failed(Path::new("d.png"), "permission denied");

        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 1);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, PathBuf::from("d.png"));
        assert_eq!(failures[0].outcome.reason(), Some("permission denied"));
    }

    #[test]
    fn test_serializes_flat_status() {
        let mut report = BatchReport::new();
        report.skipped(Path::new("x.gif"), "not an image");

        let json = serde_json::to_value(&report).unwrap();
        let item = &json["items"][0];
        assert_eq!(item["path"], "x.gif");
        assert_eq!(item["status"], "skipped");
        assert_eq!(item["reason"], "not an image");
        assert_eq!(json["cancelled"], false);
    }

    #[test]
    fn test_summary_line_mentions_cancellation() {
        let mut report = BatchReport::new();
        assert!(!report.summary_line().contains("отменена"));
        report.cancelled = true;
        assert!(report.summary_line().contains("отменена"));
    }
}
