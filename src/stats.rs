//! Counters collected during a conversion run.
//!
//! The transducer is single-threaded, so these are plain fields on a struct
//! threaded through the join driver.

use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionStats {
    /// Page rows emitted.
    pub pages: u64,
    /// Revision rows emitted.
    pub revisions: u64,
    /// Text rows emitted.
    pub text_rows: u64,
    /// Stub revisions with no content counterpart (emitted with empty text).
    pub missing_text: u64,
    /// Content revisions with no stub counterpart (discarded).
    pub orphan_revisions: u64,
    /// Content revisions whose text id repeated within a page.
    pub duplicate_text_ids: u64,
    /// Pages and revisions dropped by either parser for missing fields.
    pub skipped_records: u64,
    /// Content revisions left over after the stub stream ended.
    pub drained_content: u64,
}

impl ConversionStats {
    pub fn new() -> ConversionStats {
        ConversionStats::default()
    }

    /// One progress line, logged every few thousand pages when verbose.
    pub fn log_progress(&self) {
        info!(
            pages = self.pages,
            revisions = self.revisions,
            text_rows = self.text_rows,
            "progress"
        );
    }

    /// Final summary, logged once per run.
    pub fn log_summary(&self) {
        info!(
            pages = self.pages,
            revisions = self.revisions,
            text_rows = self.text_rows,
            missing_text = self.missing_text,
            orphan_revisions = self.orphan_revisions,
            duplicate_text_ids = self.duplicate_text_ids,
            skipped_records = self.skipped_records,
            drained_content = self.drained_content,
            "conversion complete"
        );
    }
}
