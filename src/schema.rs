//! Schema-variant policy: which columns each target MediaWiki version gets.
//!
//! Emission sites iterate a per-version column list instead of branching on
//! versions inline; supporting a new MediaWiki release means adding a column
//! slice here.

use crate::error::ErrorKind;
use crate::models::{PageRow, RevisionRow, TextRow};
use crate::sql::{push_value, SqlValue};
use std::fmt;
use std::str::FromStr;

/// A target MediaWiki schema version, `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MwVersion {
    pub major: u8,
    pub minor: u8,
}

/// Oldest MediaWiki version with a known schema layout.
pub const MIN_MW_VERSION: MwVersion = MwVersion { major: 1, minor: 5 };
/// Newest MediaWiki version with a known schema layout.
pub const MAX_MW_VERSION: MwVersion = MwVersion { major: 1, minor: 29 };

impl MwVersion {
    const fn new(major: u8, minor: u8) -> MwVersion {
        MwVersion { major, minor }
    }

    fn at_least(self, major: u8, minor: u8) -> bool {
        self >= MwVersion::new(major, minor)
    }
}

impl fmt::Display for MwVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for MwVersion {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<MwVersion, ErrorKind> {
        let parsed = s.split_once('.').and_then(|(major, minor)| {
            Some(MwVersion {
                major: major.parse().ok()?,
                minor: minor.parse().ok()?,
            })
        });
        match parsed {
            Some(v) if (MIN_MW_VERSION..=MAX_MW_VERSION).contains(&v) => Ok(v),
            Some(v) => Err(ErrorKind::Schema(format!(
                "MediaWiki {} is outside the supported range {}-{}",
                v, MIN_MW_VERSION, MAX_MW_VERSION
            ))),
            None => Err(ErrorKind::Schema(format!("cannot parse version {:?}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageColumn {
    Id,
    Namespace,
    Title,
    Restrictions,
    Counter,
    IsRedirect,
    IsNew,
    Random,
    Touched,
    Latest,
    Len,
    ContentModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionColumn {
    Id,
    Page,
    TextId,
    Comment,
    User,
    UserText,
    Timestamp,
    MinorEdit,
    Deleted,
    Len,
    ParentId,
    Sha1,
    ContentModel,
    ContentFormat,
}

use self::PageColumn as P;
use self::RevisionColumn as R;

const PAGE_COLS_1_5: &[PageColumn] = &[
    P::Id,
    P::Namespace,
    P::Title,
    P::Restrictions,
    P::Counter,
    P::IsRedirect,
    P::IsNew,
    P::Random,
    P::Touched,
    P::Latest,
    P::Len,
];

const PAGE_COLS_1_21: &[PageColumn] = &[
    P::Id,
    P::Namespace,
    P::Title,
    P::Restrictions,
    P::Counter,
    P::IsRedirect,
    P::IsNew,
    P::Random,
    P::Touched,
    P::Latest,
    P::Len,
    P::ContentModel,
];

// page_counter was dropped from core in 1.25
const PAGE_COLS_1_25: &[PageColumn] = &[
    P::Id,
    P::Namespace,
    P::Title,
    P::Restrictions,
    P::IsRedirect,
    P::IsNew,
    P::Random,
    P::Touched,
    P::Latest,
    P::Len,
    P::ContentModel,
];

const REV_COLS_1_5: &[RevisionColumn] = &[
    R::Id,
    R::Page,
    R::TextId,
    R::Comment,
    R::User,
    R::UserText,
    R::Timestamp,
    R::MinorEdit,
    R::Deleted,
];

const REV_COLS_1_10: &[RevisionColumn] = &[
    R::Id,
    R::Page,
    R::TextId,
    R::Comment,
    R::User,
    R::UserText,
    R::Timestamp,
    R::MinorEdit,
    R::Deleted,
    R::Len,
    R::ParentId,
];

const REV_COLS_1_19: &[RevisionColumn] = &[
    R::Id,
    R::Page,
    R::TextId,
    R::Comment,
    R::User,
    R::UserText,
    R::Timestamp,
    R::MinorEdit,
    R::Deleted,
    R::Len,
    R::ParentId,
    R::Sha1,
];

const REV_COLS_1_21: &[RevisionColumn] = &[
    R::Id,
    R::Page,
    R::TextId,
    R::Comment,
    R::User,
    R::UserText,
    R::Timestamp,
    R::MinorEdit,
    R::Deleted,
    R::Len,
    R::ParentId,
    R::Sha1,
    R::ContentModel,
    R::ContentFormat,
];

pub fn page_columns(version: MwVersion) -> &'static [PageColumn] {
    if version.at_least(1, 25) {
        PAGE_COLS_1_25
    } else if version.at_least(1, 21) {
        PAGE_COLS_1_21
    } else {
        PAGE_COLS_1_5
    }
}

pub fn revision_columns(version: MwVersion) -> &'static [RevisionColumn] {
    if version.at_least(1, 21) {
        REV_COLS_1_21
    } else if version.at_least(1, 19) {
        REV_COLS_1_19
    } else if version.at_least(1, 10) {
        REV_COLS_1_10
    } else {
        REV_COLS_1_5
    }
}

/// NULL when the model is the wiki-wide default, mirroring what MediaWiki
/// itself stores in rev_content_model / page_content_model.
fn content_model_value(model: &Option<String>) -> SqlValue<'_> {
    match model.as_deref() {
        None | Some("wikitext") => SqlValue::Null,
        Some(other) => SqlValue::Str(other),
    }
}

fn content_format_value(format: &Option<String>) -> SqlValue<'_> {
    match format.as_deref() {
        None | Some("text/x-wiki") => SqlValue::Null,
        Some(other) => SqlValue::Str(other),
    }
}

fn bool_value(v: bool) -> SqlValue<'static> {
    SqlValue::UInt(v as u64)
}

/// Render one page row as a `(…)` tuple into `out`, clearing it first.
pub fn format_page_tuple(version: MwVersion, row: &PageRow, out: &mut String) {
    out.clear();
    out.push('(');
    for (i, col) in page_columns(version).iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let value = match col {
            P::Id => SqlValue::UInt(row.id as u64),
            P::Namespace => SqlValue::Int(row.namespace as i64),
            P::Title => SqlValue::Str(&row.title),
            P::Restrictions => SqlValue::Str(&row.restrictions),
            P::Counter => SqlValue::UInt(0),
            P::IsRedirect => bool_value(row.is_redirect),
            P::IsNew => bool_value(row.is_new),
            P::Random => SqlValue::Float(row.random),
            P::Touched => SqlValue::Str(&row.touched),
            P::Latest => SqlValue::UInt(row.latest_rev_id as u64),
            P::Len => SqlValue::UInt(row.len as u64),
            P::ContentModel => content_model_value(&row.content_model),
        };
        push_value(out, value);
    }
    out.push(')');
}

/// Render one revision row as a `(…)` tuple into `out`, clearing it first.
pub fn format_revision_tuple(version: MwVersion, row: &RevisionRow, out: &mut String) {
    out.clear();
    out.push('(');
    for (i, col) in revision_columns(version).iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let value = match col {
            R::Id => SqlValue::UInt(row.id as u64),
            R::Page => SqlValue::UInt(row.page_id as u64),
            R::TextId => SqlValue::UInt(row.text_id as u64),
            R::Comment => SqlValue::Str(&row.comment),
            R::User => SqlValue::UInt(row.user_id as u64),
            R::UserText => SqlValue::Str(&row.user_text),
            R::Timestamp => SqlValue::Str(&row.timestamp),
            R::MinorEdit => bool_value(row.minor),
            R::Deleted => SqlValue::UInt(row.deleted as u64),
            R::Len => SqlValue::UInt(row.len as u64),
            R::ParentId => SqlValue::UInt(row.parent_id.unwrap_or(0) as u64),
            R::Sha1 => SqlValue::Str(&row.sha1),
            R::ContentModel => content_model_value(&row.model),
            R::ContentFormat => content_format_value(&row.format),
        };
        push_value(out, value);
    }
    out.push(')');
}

/// Render one text row as a `(…)` tuple into `out`, clearing it first.
///
/// The text table kept the same three columns across every supported
/// version.
pub fn format_text_tuple(row: &TextRow, out: &mut String) {
    out.clear();
    out.push('(');
    push_value(out, SqlValue::UInt(row.id as u64));
    out.push(',');
    push_value(out, SqlValue::Str(&row.content));
    out.push(',');
    push_value(out, SqlValue::Str(row.flags));
    out.push(')');
}
