//! Core data types shared between the dump parser and the join driver.

use chrono::NaiveDateTime;

/// rev_deleted bit: text body redacted.
pub const DELETED_TEXT: u8 = 1;
/// rev_deleted bit: edit comment redacted.
pub const DELETED_COMMENT: u8 = 2;
/// rev_deleted bit: contributor redacted.
pub const DELETED_USER: u8 = 4;

/// Page metadata collected from the elements preceding the first revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub id: u32,
    pub namespace: i16,
    pub title: String,
    pub restrictions: String,
    pub is_redirect: bool,
}

/// One `<revision>` element, fully assembled.
///
/// The stub stream leaves `text` as `None` and usually carries the byte
/// length and text id as attributes of an empty `<text/>`; the content
/// stream carries the body itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRecord {
    pub id: u32,
    pub parent_id: Option<u32>,
    /// 14-digit DB timestamp, already converted from ISO 8601.
    pub timestamp: String,
    /// 0 for anonymous (IP) contributors.
    pub user_id: u32,
    /// Username, or the IP for anonymous edits.
    pub user_text: String,
    pub minor: bool,
    pub comment: String,
    /// rev_deleted bitmask assembled from `deleted="deleted"` markers.
    pub deleted: u8,
    pub model: Option<String>,
    pub format: Option<String>,
    /// Source-provided base-36 SHA-1, kept only when it validates.
    pub sha1: Option<String>,
    /// `id` attribute of the `<text>` element.
    pub dump_text_id: Option<u32>,
    /// `bytes` attribute of the `<text>` element.
    pub text_bytes: Option<u32>,
    pub text: Option<String>,
}

impl RevisionRecord {
    pub fn text_deleted(&self) -> bool {
        self.deleted & DELETED_TEXT != 0
    }
}

/// A fully joined row for the page table; formatted by the schema policy.
#[derive(Debug, Clone)]
pub struct PageRow {
    pub id: u32,
    pub namespace: i16,
    pub title: String,
    pub restrictions: String,
    pub is_redirect: bool,
    pub is_new: bool,
    pub random: f64,
    /// Timestamp of the newest revision, DB format.
    pub touched: String,
    pub latest_rev_id: u32,
    pub len: u32,
    /// Content model of the newest revision, if any was declared.
    pub content_model: Option<String>,
}

/// A fully joined row for the revision table.
#[derive(Debug, Clone)]
pub struct RevisionRow {
    pub id: u32,
    pub page_id: u32,
    pub text_id: u32,
    pub comment: String,
    pub user_id: u32,
    pub user_text: String,
    pub timestamp: String,
    pub minor: bool,
    pub deleted: u8,
    pub len: u32,
    pub parent_id: Option<u32>,
    pub sha1: String,
    pub model: Option<String>,
    pub format: Option<String>,
}

/// A row for the text table.
#[derive(Debug, Clone)]
pub struct TextRow {
    pub id: u32,
    pub content: String,
    pub flags: &'static str,
}

const TIMESTAMP_FORMAT_ISO: &str = "%Y-%m-%dT%H:%M:%SZ";
const TIMESTAMP_FORMAT_DB: &str = "%Y%m%d%H%M%S";

/// Convert an ISO 8601 dump timestamp to the 14-digit DB format.
///
/// Dumps converted from SQL sometimes already carry the DB format; both are
/// accepted. Returns `None` for anything else.
pub fn db_timestamp(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT_ISO)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT_DB))
        .ok()
        .map(|dt| dt.format(TIMESTAMP_FORMAT_DB).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_timestamp_converts() {
        assert_eq!(
            db_timestamp("2013-01-15T12:00:00Z").as_deref(),
            Some("20130115120000")
        );
    }

    #[test]
    fn db_timestamp_passes_through() {
        assert_eq!(
            db_timestamp("20130115120000").as_deref(),
            Some("20130115120000")
        );
    }

    #[test]
    fn invalid_timestamp_rejected() {
        assert!(db_timestamp("2013-01-15 12:00:00").is_none());
        assert!(db_timestamp("not a date").is_none());
        assert!(db_timestamp("").is_none());
    }

    #[test]
    fn leap_day_roundtrips() {
        assert_eq!(
            db_timestamp("2012-02-29T23:59:59Z").as_deref(),
            Some("20120229235959")
        );
    }

    #[test]
    fn impossible_date_rejected() {
        assert!(db_timestamp("2013-02-30T00:00:00Z").is_none());
    }

    #[test]
    fn text_deleted_flag() {
        let rev = RevisionRecord {
            id: 1,
            parent_id: None,
            timestamp: "20130115120000".into(),
            user_id: 0,
            user_text: "192.0.2.1".into(),
            minor: false,
            comment: String::new(),
            deleted: DELETED_TEXT | DELETED_COMMENT,
            model: None,
            format: None,
            sha1: None,
            dump_text_id: None,
            text_bytes: None,
            text: None,
        };
        assert!(rev.text_deleted());
    }
}
