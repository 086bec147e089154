//! Streaming parser for MediaWiki export XML (schema 0.5 through 0.10).
//!
//! A pull interface over quick-xml events: the caller drives
//! [`DumpReader::next_event`] and receives page boundaries and fully
//! assembled revision records, one at a time. Nothing is ever buffered
//! beyond the record under construction, so multi-gigabyte dumps stream in
//! constant memory.
//!
//! The parser is deliberately lenient. Unknown elements are skipped,
//! records with missing mandatory fields are dropped and counted, and
//! undecodable entities pass through as raw bytes. Only framing problems
//! (truncated file, malformed XML) are fatal.

use crate::config::{MAX_SCHEMA_VERSION, MIN_SCHEMA_VERSION};
use crate::digest::is_valid_sha1;
use crate::error::ErrorKind;
use crate::models::{
    db_timestamp, PageMeta, RevisionRecord, DELETED_COMMENT, DELETED_TEXT, DELETED_USER,
};
use anyhow::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use tracing::warn;

/// One step of a dump traversal.
#[derive(Debug)]
pub enum DumpEvent {
    PageStart(PageMeta),
    Revision(Box<RevisionRecord>),
    PageEnd,
    Eof,
}

/// The simple element whose character data we are currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    PageTitle,
    PageNs,
    PageId,
    PageRestrictions,
    RevId,
    RevParentId,
    RevTimestamp,
    RevComment,
    RevModel,
    RevFormat,
    RevSha1,
    RevText,
    ContribId,
    ContribUsername,
    ContribIp,
}

#[derive(Debug, Default)]
struct PageBuilder {
    id: Option<u32>,
    namespace: i16,
    title: Option<String>,
    restrictions: String,
    is_redirect: bool,
}

impl PageBuilder {
    fn try_build(self) -> Option<PageMeta> {
        Some(PageMeta {
            id: self.id?,
            namespace: self.namespace,
            title: self.title?,
            restrictions: self.restrictions,
            is_redirect: self.is_redirect,
        })
    }
}

#[derive(Debug, Default)]
struct RevisionBuilder {
    id: Option<u32>,
    parent_id: Option<u32>,
    timestamp_raw: Option<String>,
    user_id: Option<u32>,
    user_text: Option<String>,
    minor: bool,
    comment: String,
    deleted: u8,
    model: Option<String>,
    format: Option<String>,
    sha1: Option<String>,
    dump_text_id: Option<u32>,
    text_bytes: Option<u32>,
    saw_text: bool,
    text: Option<String>,
}

impl RevisionBuilder {
    fn try_build(mut self, skip_text: bool) -> Option<RevisionRecord> {
        let id = self.id?;
        let timestamp = db_timestamp(self.timestamp_raw.as_deref()?)?;
        if !skip_text && !self.saw_text {
            // no <text> element at all: treated like an explicit deletion
            self.deleted |= DELETED_TEXT;
        }
        let text = if skip_text || self.deleted & DELETED_TEXT != 0 {
            None
        } else {
            Some(self.text.unwrap_or_default())
        };
        Some(RevisionRecord {
            id,
            parent_id: self.parent_id,
            timestamp,
            user_id: self.user_id.unwrap_or(0),
            user_text: self.user_text.unwrap_or_default(),
            minor: self.minor,
            comment: self.comment,
            deleted: self.deleted,
            model: self.model,
            format: self.format,
            sha1: self.sha1,
            dump_text_id: self.dump_text_id,
            text_bytes: self.text_bytes,
            text,
        })
    }
}

/// Pull parser over one dump stream.
pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Stub mode: text bodies are not retained.
    skip_text: bool,
    schema_version: Option<(u32, u32)>,
    in_siteinfo: bool,
    in_contributor: bool,
    page: Option<PageBuilder>,
    page_emitted: bool,
    skipping_page: bool,
    rev: Option<RevisionBuilder>,
    field: Option<Field>,
    pending: Option<DumpEvent>,
    warned_entity: bool,
    warned_skip: bool,
    skipped_pages: u64,
    skipped_revisions: u64,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(reader: R, skip_text: bool) -> DumpReader<R> {
        DumpReader {
            reader: Reader::from_reader(reader),
            buf: Vec::with_capacity(64 * 1024),
            skip_text,
            schema_version: None,
            in_siteinfo: false,
            in_contributor: false,
            page: None,
            page_emitted: false,
            skipping_page: false,
            rev: None,
            field: None,
            pending: None,
            warned_entity: false,
            warned_skip: false,
            skipped_pages: 0,
            skipped_revisions: 0,
        }
    }

    /// Export schema version from the `<mediawiki>` root, once seen.
    pub fn schema_version(&self) -> Option<(u32, u32)> {
        self.schema_version
    }

    /// Pages and revisions dropped for missing mandatory fields.
    pub fn skipped_records(&self) -> u64 {
        self.skipped_pages + self.skipped_revisions
    }

    fn xml_error(&self, reason: impl ToString) -> ErrorKind {
        ErrorKind::Xml {
            offset: self.reader.buffer_position() as u64,
            reason: reason.to_string(),
        }
    }

    fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
        e.try_get_attribute(name)
            .ok()
            .flatten()
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
    }

    fn decode_text(&mut self, e: &quick_xml::events::BytesText) -> String {
        match e.unescape() {
            Ok(cow) => cow.into_owned(),
            Err(err) => {
                if !self.warned_entity {
                    self.warned_entity = true;
                    warn!(
                        error = %err,
                        position = self.reader.buffer_position(),
                        "undecodable entity, passing raw bytes through"
                    );
                }
                String::from_utf8_lossy(e).into_owned()
            }
        }
    }

    fn count_skipped_revision(&mut self) {
        self.skipped_revisions += 1;
        if !self.warned_skip {
            self.warned_skip = true;
            warn!(
                position = self.reader.buffer_position(),
                "dropping record with missing mandatory fields \
                 (further drops are counted silently)"
            );
        }
    }

    fn check_schema_version(&mut self, e: &BytesStart) -> Result<()> {
        let Some(raw) = Self::attr(e, b"version") else {
            warn!("<mediawiki> carries no version attribute, assuming a supported schema");
            return Ok(());
        };
        let parsed = raw.split_once('.').and_then(|(major, minor)| {
            Some((major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?))
        });
        match parsed {
            Some(v) if (MIN_SCHEMA_VERSION..=MAX_SCHEMA_VERSION).contains(&v) => {
                self.schema_version = Some(v);
                Ok(())
            }
            _ => Err(ErrorKind::Schema(format!(
                "export schema {:?} is outside the supported range {}.{}-{}.{}",
                raw,
                MIN_SCHEMA_VERSION.0,
                MIN_SCHEMA_VERSION.1,
                MAX_SCHEMA_VERSION.0,
                MAX_SCHEMA_VERSION.1
            ))
            .into()),
        }
    }

    /// Route a start (or empty) tag to the field it populates.
    fn handle_start(&mut self, e: &BytesStart, is_empty: bool) -> Result<Option<DumpEvent>> {
        let name = e.name();
        let name = name.as_ref();
        if self.in_siteinfo {
            return Ok(None);
        }
        match name {
            b"mediawiki" => self.check_schema_version(e)?,
            b"siteinfo" => self.in_siteinfo = !is_empty,
            b"page" => {
                self.page = Some(PageBuilder::default());
                self.page_emitted = false;
                self.skipping_page = false;
            }
            _ if self.skipping_page => {}
            b"revision" => {
                self.rev = Some(RevisionBuilder::default());
                if !self.page_emitted {
                    // page metadata is complete once the first revision opens
                    match self.page.take().and_then(PageBuilder::try_build) {
                        Some(meta) => {
                            self.page_emitted = true;
                            return Ok(Some(DumpEvent::PageStart(meta)));
                        }
                        None => {
                            self.skipped_pages += 1;
                            self.skipping_page = true;
                            self.rev = None;
                            warn!(
                                position = self.reader.buffer_position(),
                                "skipping page with missing id or title"
                            );
                        }
                    }
                }
            }
            b"title" => self.field = Some(Field::PageTitle),
            b"ns" => self.field = Some(Field::PageNs),
            b"restrictions" => self.field = Some(Field::PageRestrictions),
            b"redirect" => {
                if let Some(page) = self.page.as_mut() {
                    page.is_redirect = true;
                }
            }
            b"contributor" if self.rev.is_some() => {
                self.in_contributor = !is_empty;
                if Self::attr(e, b"deleted").is_some() {
                    if let Some(rev) = self.rev.as_mut() {
                        rev.deleted |= DELETED_USER;
                    }
                }
            }
            b"id" => {
                self.field = if self.in_contributor {
                    Some(Field::ContribId)
                } else if self.rev.is_some() {
                    Some(Field::RevId)
                } else if self.page.as_ref().is_some_and(|p| p.id.is_none()) {
                    Some(Field::PageId)
                } else {
                    None
                };
            }
            b"username" if self.in_contributor => self.field = Some(Field::ContribUsername),
            b"ip" if self.in_contributor => self.field = Some(Field::ContribIp),
            b"parentid" if self.rev.is_some() => self.field = Some(Field::RevParentId),
            b"timestamp" if self.rev.is_some() => self.field = Some(Field::RevTimestamp),
            b"minor" if self.rev.is_some() => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.minor = true;
                }
            }
            b"comment" if self.rev.is_some() => {
                if Self::attr(e, b"deleted").is_some() {
                    if let Some(rev) = self.rev.as_mut() {
                        rev.deleted |= DELETED_COMMENT;
                    }
                } else {
                    self.field = Some(Field::RevComment);
                }
            }
            b"model" if self.rev.is_some() => self.field = Some(Field::RevModel),
            b"format" if self.rev.is_some() => self.field = Some(Field::RevFormat),
            b"sha1" if self.rev.is_some() => self.field = Some(Field::RevSha1),
            b"text" => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.saw_text = true;
                    rev.dump_text_id = Self::attr(e, b"id").and_then(|v| v.parse().ok());
                    rev.text_bytes = Self::attr(e, b"bytes").and_then(|v| v.parse().ok());
                    // the sha1 attribute is preferred over the <sha1> element
                    if let Some(sha1) = Self::attr(e, b"sha1").filter(|v| is_valid_sha1(v)) {
                        rev.sha1 = Some(sha1);
                    }
                    if Self::attr(e, b"deleted").is_some() {
                        rev.deleted |= DELETED_TEXT;
                    } else if !self.skip_text && rev.text.is_none() {
                        rev.text = Some(String::new());
                    }
                    if !is_empty {
                        self.field = Some(Field::RevText);
                    }
                }
            }
            b"deleted" => {
                // <text><deleted/></text> variant
                if let Some(rev) = self.rev.as_mut() {
                    if self.field == Some(Field::RevText) || rev.saw_text {
                        rev.deleted |= DELETED_TEXT;
                        rev.text = None;
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_text(&mut self, text: String) {
        if self.skipping_page {
            return;
        }
        let Some(field) = self.field else { return };
        match field {
            Field::PageTitle => {
                if let Some(page) = self.page.as_mut() {
                    page.title = Some(text);
                }
            }
            Field::PageNs => {
                if let Some(page) = self.page.as_mut() {
                    page.namespace = text.trim().parse().unwrap_or_else(|_| {
                        warn!(ns = %text, "invalid namespace id, defaulting to 0");
                        0
                    });
                }
            }
            Field::PageId => {
                if let Some(page) = self.page.as_mut() {
                    page.id = text.trim().parse().ok();
                }
            }
            Field::PageRestrictions => {
                if let Some(page) = self.page.as_mut() {
                    page.restrictions = text;
                }
            }
            Field::RevId => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.id = text.trim().parse().ok();
                }
            }
            Field::RevParentId => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.parent_id = text.trim().parse().ok();
                }
            }
            Field::RevTimestamp => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.timestamp_raw = Some(text);
                }
            }
            Field::RevComment => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.comment.push_str(&text);
                }
            }
            Field::RevModel => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.model = Some(text);
                }
            }
            Field::RevFormat => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.format = Some(text);
                }
            }
            Field::RevSha1 => {
                if let Some(rev) = self.rev.as_mut() {
                    let value = text.trim().to_string();
                    if is_valid_sha1(&value) {
                        // the text element's sha1 attribute wins when both exist
                        rev.sha1.get_or_insert(value);
                    } else {
                        warn!(sha1 = %value, "ignoring invalid sha1 value");
                    }
                }
            }
            Field::RevText => {
                if self.skip_text {
                    return;
                }
                if let Some(rev) = self.rev.as_mut() {
                    if rev.deleted & DELETED_TEXT == 0 {
                        rev.text.get_or_insert_with(String::new).push_str(&text);
                    }
                }
            }
            Field::ContribId => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.user_id = text.trim().parse().ok();
                }
            }
            Field::ContribUsername => {
                if let Some(rev) = self.rev.as_mut() {
                    rev.user_text = Some(text);
                }
            }
            Field::ContribIp => {
                if let Some(rev) = self.rev.as_mut() {
                    // anonymous edit: rev_user stays 0, the IP is the user text
                    rev.user_id = Some(0);
                    rev.user_text = Some(text);
                }
            }
        }
    }

    fn handle_end(&mut self, name: &[u8]) -> Option<DumpEvent> {
        self.field = None;
        match name {
            b"siteinfo" => {
                self.in_siteinfo = false;
                None
            }
            b"contributor" => {
                self.in_contributor = false;
                None
            }
            b"revision" => {
                let built = self.rev.take().and_then(|b| b.try_build(self.skip_text));
                match built {
                    Some(rev) if !self.skipping_page => {
                        Some(DumpEvent::Revision(Box::new(rev)))
                    }
                    Some(_) => None,
                    None => {
                        if !self.skipping_page {
                            self.count_skipped_revision();
                        }
                        None
                    }
                }
            }
            b"page" => {
                if self.skipping_page {
                    self.skipping_page = false;
                    self.page = None;
                    return None;
                }
                if self.page_emitted {
                    self.page_emitted = false;
                    return Some(DumpEvent::PageEnd);
                }
                // a page without any revision: emit its boundaries back to back
                match self.page.take().and_then(PageBuilder::try_build) {
                    Some(meta) => {
                        self.pending = Some(DumpEvent::PageEnd);
                        Some(DumpEvent::PageStart(meta))
                    }
                    None => {
                        self.skipped_pages += 1;
                        warn!(
                            position = self.reader.buffer_position(),
                            "skipping page with missing id or title"
                        );
                        None
                    }
                }
            }
            _ => None,
        }
    }

    /// Advance to the next page boundary or revision record.
    pub fn next_event(&mut self) -> Result<DumpEvent> {
        if let Some(event) = self.pending.take() {
            return Ok(event);
        }
        // the event borrows the buffer, so it is taken out of self for the
        // duration of each read to keep the borrow checker satisfied
        let mut buf = std::mem::take(&mut self.buf);
        loop {
            buf.clear();
            let step: Result<Option<DumpEvent>> = match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => self.handle_start(e, false),
                Ok(Event::Empty(ref e)) => {
                    let out = self.handle_start(e, true);
                    self.field = None;
                    out
                }
                Ok(Event::Text(ref e)) => {
                    if self.field.is_some() {
                        let text = self.decode_text(e);
                        self.handle_text(text);
                    }
                    Ok(None)
                }
                Ok(Event::CData(ref e)) => {
                    if self.field.is_some() {
                        let text = String::from_utf8_lossy(e).into_owned();
                        self.handle_text(text);
                    }
                    Ok(None)
                }
                Ok(Event::End(ref e)) => Ok(self.handle_end(e.name().as_ref())),
                Ok(Event::Eof) => {
                    if self.page.is_some() || self.rev.is_some() || self.page_emitted {
                        Err(self
                            .xml_error("unexpected end of file inside a page")
                            .into())
                    } else {
                        Ok(Some(DumpEvent::Eof))
                    }
                }
                Ok(_) => Ok(None),
                Err(err) => Err(self.xml_error(err).into()),
            };
            match step {
                Ok(Some(event)) => {
                    self.buf = buf;
                    return Ok(event);
                }
                Ok(None) => {}
                Err(err) => {
                    self.buf = buf;
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(xml: &str, skip_text: bool) -> DumpReader<Cursor<Vec<u8>>> {
        DumpReader::new(Cursor::new(xml.as_bytes().to_vec()), skip_text)
    }

    fn drain(xml: &str, skip_text: bool) -> Vec<DumpEvent> {
        let mut parser = reader(xml, skip_text);
        let mut events = Vec::new();
        loop {
            match parser.next_event().unwrap() {
                DumpEvent::Eof => break,
                event => events.push(event),
            }
        }
        events
    }

    const CONTENT_XML: &str = r#"<mediawiki version="0.10">
      <siteinfo>
        <sitename>Testwiki</sitename>
        <namespaces><namespace key="0" /></namespaces>
      </siteinfo>
      <page>
        <title>Main Page</title>
        <ns>0</ns>
        <id>1</id>
        <revision>
          <id>10</id>
          <timestamp>2013-01-15T12:00:00Z</timestamp>
          <contributor><username>Bob</username><id>2</id></contributor>
          <comment>first edit</comment>
          <model>wikitext</model>
          <format>text/x-wiki</format>
          <text id="7" bytes="5" xml:space="preserve">Hello</text>
        </revision>
      </page>
    </mediawiki>"#;

    #[test]
    fn parses_a_content_page() {
        let events = drain(CONTENT_XML, false);
        assert_eq!(events.len(), 3);
        let DumpEvent::PageStart(meta) = &events[0] else {
            panic!("expected PageStart, got {:?}", events[0]);
        };
        assert_eq!(meta.id, 1);
        assert_eq!(meta.title, "Main Page");
        assert_eq!(meta.namespace, 0);
        assert!(!meta.is_redirect);

        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision, got {:?}", events[1]);
        };
        assert_eq!(rev.id, 10);
        assert_eq!(rev.timestamp, "20130115120000");
        assert_eq!(rev.user_id, 2);
        assert_eq!(rev.user_text, "Bob");
        assert_eq!(rev.comment, "first edit");
        assert_eq!(rev.model.as_deref(), Some("wikitext"));
        assert_eq!(rev.dump_text_id, Some(7));
        assert_eq!(rev.text_bytes, Some(5));
        assert_eq!(rev.text.as_deref(), Some("Hello"));

        assert!(matches!(events[2], DumpEvent::PageEnd));
    }

    #[test]
    fn stub_mode_drops_text_bodies() {
        let events = drain(CONTENT_XML, true);
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert_eq!(rev.text, None);
        assert_eq!(rev.text_bytes, Some(5));
        assert_eq!(rev.dump_text_id, Some(7));
    }

    #[test]
    fn schema_version_is_captured() {
        let mut parser = reader(CONTENT_XML, true);
        loop {
            if matches!(parser.next_event().unwrap(), DumpEvent::Eof) {
                break;
            }
        }
        assert_eq!(parser.schema_version(), Some((0, 10)));
    }

    #[test]
    fn unsupported_schema_version_is_fatal() {
        let xml = r#"<mediawiki version="0.4"><page><title>T</title><id>1</id></page></mediawiki>"#;
        let mut parser = reader(xml, true);
        let err = parser.next_event().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::Schema(_))
        ));
    }

    #[test]
    fn ip_contributor_maps_to_anonymous() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>T</title><ns>0</ns><id>3</id>
          <revision>
            <id>30</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <contributor><ip>192.0.2.1</ip></contributor>
            <text>x</text>
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert_eq!(rev.user_id, 0);
        assert_eq!(rev.user_text, "192.0.2.1");
    }

    #[test]
    fn deleted_text_sets_flag() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>T</title><ns>0</ns><id>3</id>
          <revision>
            <id>30</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <contributor><username>A</username><id>5</id></contributor>
            <text deleted="deleted" />
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert!(rev.text_deleted());
        assert_eq!(rev.text, None);
    }

    #[test]
    fn nested_deleted_element_sets_flag() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>T</title><ns>0</ns><id>3</id>
          <revision>
            <id>30</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <contributor><username>A</username><id>5</id></contributor>
            <text><deleted/></text>
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert!(rev.text_deleted());
    }

    #[test]
    fn deleted_comment_and_contributor() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>T</title><ns>0</ns><id>3</id>
          <revision>
            <id>30</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <contributor deleted="deleted" />
            <comment deleted="deleted" />
            <text>x</text>
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert_eq!(rev.deleted, DELETED_COMMENT | DELETED_USER);
        assert_eq!(rev.user_id, 0);
        assert_eq!(rev.user_text, "");
    }

    #[test]
    fn missing_timestamp_skips_revision() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>T</title><ns>0</ns><id>3</id>
          <revision>
            <id>30</id>
            <contributor><username>A</username><id>5</id></contributor>
            <text>x</text>
          </revision>
          <revision>
            <id>31</id>
            <timestamp>2013-01-15T12:00:01Z</timestamp>
            <contributor><username>A</username><id>5</id></contributor>
            <text>y</text>
          </revision>
        </page></mediawiki>"#;
        let mut parser = reader(xml, false);
        let mut ids = Vec::new();
        loop {
            match parser.next_event().unwrap() {
                DumpEvent::Revision(rev) => ids.push(rev.id),
                DumpEvent::Eof => break,
                _ => {}
            }
        }
        assert_eq!(ids, vec![31]);
        assert_eq!(parser.skipped_records(), 1);
    }

    #[test]
    fn page_without_id_is_skipped() {
        let xml = r#"<mediawiki version="0.10">
          <page>
            <title>Broken</title><ns>0</ns>
            <revision>
              <id>30</id>
              <timestamp>2013-01-15T12:00:00Z</timestamp>
              <text>x</text>
            </revision>
          </page>
          <page>
            <title>Fine</title><ns>0</ns><id>4</id>
            <revision>
              <id>40</id>
              <timestamp>2013-01-15T12:00:00Z</timestamp>
              <text>y</text>
            </revision>
          </page>
        </mediawiki>"#;
        let events = drain(xml, false);
        assert_eq!(events.len(), 3);
        let DumpEvent::PageStart(meta) = &events[0] else {
            panic!("expected PageStart");
        };
        assert_eq!(meta.title, "Fine");
    }

    #[test]
    fn redirect_and_restrictions() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>Old</title><ns>0</ns><id>9</id>
          <redirect title="New" />
          <restrictions>sysop</restrictions>
          <revision>
            <id>90</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <text>#REDIRECT [[New]]</text>
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::PageStart(meta) = &events[0] else {
            panic!("expected PageStart");
        };
        assert!(meta.is_redirect);
        assert_eq!(meta.restrictions, "sysop");
    }

    #[test]
    fn entities_are_decoded() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>AT&amp;T</title><ns>0</ns><id>5</id>
          <revision>
            <id>50</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <text>&lt;b&gt;bold&#33;&lt;/b&gt;</text>
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::PageStart(meta) = &events[0] else {
            panic!("expected PageStart");
        };
        assert_eq!(meta.title, "AT&T");
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert_eq!(rev.text.as_deref(), Some("<b>bold!</b>"));
    }

    #[test]
    fn text_sha1_attribute_wins_over_element() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>T</title><ns>0</ns><id>5</id>
          <revision>
            <id>50</id>
            <timestamp>2013-01-15T12:00:00Z</timestamp>
            <sha1>phoiac9h4m842xq45sp7s6u21eteeq1</sha1>
            <text sha1="syvtbocopvw4f81bf07ocly0sl8ybqo">Hello</text>
          </revision>
        </page></mediawiki>"#;
        let events = drain(xml, false);
        let DumpEvent::Revision(rev) = &events[1] else {
            panic!("expected Revision");
        };
        assert_eq!(rev.sha1.as_deref(), Some("syvtbocopvw4f81bf07ocly0sl8ybqo"));
    }

    #[test]
    fn empty_page_emits_both_boundaries() {
        let xml = r#"<mediawiki version="0.10"><page>
          <title>Empty</title><ns>0</ns><id>5</id>
        </page></mediawiki>"#;
        let events = drain(xml, true);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DumpEvent::PageStart(_)));
        assert!(matches!(events[1], DumpEvent::PageEnd));
    }

    #[test]
    fn truncated_dump_is_an_xml_error() {
        let xml = r#"<mediawiki version="0.10"><page><title>T</title><id>1</id>"#;
        let mut parser = reader(xml, true);
        let err = parser.next_event().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::Xml { .. })
        ));
    }

    #[test]
    fn multiple_pages_stream_in_order() {
        let xml = r#"<mediawiki version="0.10">
          <page><title>A</title><ns>0</ns><id>1</id>
            <revision><id>10</id><timestamp>2013-01-15T12:00:00Z</timestamp><text>a</text></revision>
          </page>
          <page><title>B</title><ns>0</ns><id>2</id>
            <revision><id>20</id><timestamp>2013-01-15T12:00:01Z</timestamp><text>b</text></revision>
            <revision><id>21</id><timestamp>2013-01-15T12:00:02Z</timestamp><text>b2</text></revision>
          </page>
        </mediawiki>"#;
        let events = drain(xml, false);
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                DumpEvent::PageStart(_) => "start",
                DumpEvent::Revision(_) => "rev",
                DumpEvent::PageEnd => "end",
                DumpEvent::Eof => "eof",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["start", "rev", "end", "start", "rev", "rev", "end"]
        );
    }
}
