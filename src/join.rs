//! The dual-stream join driver.
//!
//! The stub stream is the spine: it dictates page order and revision order.
//! The content stream trails behind with exactly one revision of lookahead,
//! matched by revision id. Both dumps traverse pages in the same order, so
//! a single forward pass joins them in constant memory.

use crate::config::{DEFAULT_TEXT_FLAGS, DESYNC_TOLERANCE, PROGRESS_INTERVAL};
use crate::digest::sha1_base36;
use crate::error::ErrorKind;
use crate::models::{PageMeta, PageRow, RevisionRecord, RevisionRow, TextRow};
use crate::parser::{DumpEvent, DumpReader};
use crate::schema::{format_page_tuple, format_revision_tuple, format_text_tuple, MwVersion};
use crate::sql::SqlOutputs;
use crate::stats::ConversionStats;
use crate::stream;
use anyhow::Result;
use rand::Rng;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Everything a conversion run needs to know.
#[derive(Debug)]
pub struct RunConfig {
    pub stubs: PathBuf,
    pub text: PathBuf,
    pub sql_prefix: String,
    pub mw_version: MwVersion,
    pub start_text_id: u32,
}

/// Open the two inputs and three outputs, then join.
pub fn run(config: &RunConfig) -> Result<ConversionStats> {
    let stub = DumpReader::new(stream::open_read(&config.stubs)?, true);
    let content = DumpReader::new(stream::open_read(&config.text)?, false);
    let outputs = SqlOutputs::create(&config.sql_prefix)?;
    join_streams(stub, content, outputs, config.mw_version, config.start_text_id)
}

/// Content-stream cursor with one revision of lookahead.
struct ContentCursor<R: BufRead> {
    reader: DumpReader<R>,
    current: Option<Box<RevisionRecord>>,
    eof: bool,
}

impl<R: BufRead> ContentCursor<R> {
    fn new(reader: DumpReader<R>) -> ContentCursor<R> {
        ContentCursor {
            reader,
            current: None,
            eof: false,
        }
    }

    /// The next content revision, pulling past page boundaries.
    fn peek(&mut self) -> Result<Option<&RevisionRecord>> {
        while self.current.is_none() && !self.eof {
            match self.reader.next_event()? {
                DumpEvent::Revision(rev) => self.current = Some(rev),
                DumpEvent::Eof => self.eof = true,
                DumpEvent::PageStart(_) | DumpEvent::PageEnd => {}
            }
        }
        Ok(self.current.as_deref())
    }

    fn take(&mut self) -> Option<Box<RevisionRecord>> {
        self.current.take()
    }
}

/// Accumulated state for the stub page currently being joined.
struct PageState {
    meta: PageMeta,
    rev_count: u32,
    latest_rev_id: u32,
    latest_len: u32,
    latest_timestamp: String,
    latest_model: Option<String>,
    /// dump text id -> allocated old_id, for duplicate tolerance
    seen_text_ids: HashMap<u32, u32>,
    warned_missing: bool,
}

impl PageState {
    fn new(meta: PageMeta) -> PageState {
        PageState {
            meta,
            rev_count: 0,
            latest_rev_id: 0,
            latest_len: 0,
            latest_timestamp: String::new(),
            latest_model: None,
            seen_text_ids: HashMap::new(),
            warned_missing: false,
        }
    }
}

/// Join a stub and a content stream into the three SQL outputs.
pub fn join_streams<S: BufRead, C: BufRead>(
    mut stub: DumpReader<S>,
    content: DumpReader<C>,
    mut outputs: SqlOutputs,
    version: MwVersion,
    start_text_id: u32,
) -> Result<ConversionStats> {
    let mut content = ContentCursor::new(content);
    let mut stats = ConversionStats::new();
    let mut next_text_id = start_text_id;
    let mut tuple = String::new();
    let mut page: Option<PageState> = None;

    loop {
        match stub.next_event()? {
            DumpEvent::PageStart(meta) => {
                debug!(page_id = meta.id, title = %meta.title, "joining page");
                page = Some(PageState::new(meta));
            }
            DumpEvent::Revision(rev) => {
                let Some(state) = page.as_mut() else {
                    // the parser only yields revisions inside a page
                    return Err(ErrorKind::Internal(
                        "revision outside of any page".into(),
                    )
                    .into());
                };
                let matched = advance_content(&mut content, rev.id, &mut stats)?;
                emit_revision(
                    state,
                    *rev,
                    matched.map(|b| *b),
                    version,
                    &mut next_text_id,
                    &mut outputs,
                    &mut stats,
                    &mut tuple,
                )?;
            }
            DumpEvent::PageEnd => {
                if let Some(state) = page.take() {
                    emit_page(state, version, &mut outputs, &mut stats, &mut tuple)?;
                }
            }
            DumpEvent::Eof => break,
        }
    }

    // stub EOF ends the run; whatever the content stream still holds is
    // surplus and only counted
    while content.peek()?.is_some() {
        content.take();
        stats.drained_content += 1;
    }
    if stats.drained_content > 0 {
        warn!(
            count = stats.drained_content,
            "content stream had revisions left after the stub stream ended"
        );
    }

    stats.skipped_records = stub.skipped_records() + content.reader.skipped_records();
    outputs.finish()?;
    stats.log_summary();
    Ok(stats)
}

/// Advance the content stream until it reaches `rev_id`.
///
/// Returns the matching revision, or `None` when the content stream is
/// already past it (or exhausted). Orphans are discarded with a counter;
/// too many in a row means the streams are not two views of the same dump.
fn advance_content<R: BufRead>(
    content: &mut ContentCursor<R>,
    rev_id: u32,
    stats: &mut ConversionStats,
) -> Result<Option<Box<RevisionRecord>>> {
    let mut scanned = 0u32;
    loop {
        let Some(current) = content.peek()? else {
            return Ok(None);
        };
        if current.id == rev_id {
            return Ok(content.take());
        }
        if current.id > rev_id {
            return Ok(None);
        }
        // content revision with no stub counterpart
        if stats.orphan_revisions == 0 {
            warn!(
                orphan = current.id,
                expected = rev_id,
                "discarding content revision with no stub counterpart"
            );
        }
        stats.orphan_revisions += 1;
        content.take();
        scanned += 1;
        if scanned > DESYNC_TOLERANCE {
            return Err(ErrorKind::JoinDesync(format!(
                "scanned {} content revisions without reaching revision {}",
                scanned, rev_id
            ))
            .into());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_revision(
    state: &mut PageState,
    stub: RevisionRecord,
    matched: Option<RevisionRecord>,
    version: MwVersion,
    next_text_id: &mut u32,
    outputs: &mut SqlOutputs,
    stats: &mut ConversionStats,
    tuple: &mut String,
) -> Result<()> {
    let (content_text, content_bytes, content_sha1, content_model, content_format, dump_text_id, content_deleted) =
        match matched {
            Some(m) => (
                m.text,
                m.text_bytes,
                m.sha1,
                m.model,
                m.format,
                m.dump_text_id,
                m.deleted,
            ),
            None => {
                stats.missing_text += 1;
                if !state.warned_missing {
                    state.warned_missing = true;
                    info!(
                        page_id = state.meta.id,
                        rev_id = stub.id,
                        "stub revision has no content counterpart, emitting empty text"
                    );
                }
                (None, None, None, None, None, None, 0)
            }
        };

    let deleted = stub.deleted | content_deleted;
    let body = content_text.unwrap_or_default();
    let len = stub
        .text_bytes
        .or(content_bytes)
        .unwrap_or(body.len() as u32);
    let sha1 = stub
        .sha1
        .or(content_sha1)
        .unwrap_or_else(|| sha1_base36(body.as_bytes()));
    let model = stub.model.or(content_model);
    let format = stub.format.or(content_format);

    // duplicate text ids reference the first occurrence's row
    let (text_id, fresh) = match dump_text_id.and_then(|id| state.seen_text_ids.get(&id).copied()) {
        Some(existing) => {
            stats.duplicate_text_ids += 1;
            if stats.duplicate_text_ids == 1 {
                warn!(
                    dump_text_id = dump_text_id.unwrap_or(0),
                    rev_id = stub.id,
                    "duplicate text id in content stream, keeping the first occurrence"
                );
            }
            (existing, false)
        }
        None => {
            let id = *next_text_id;
            *next_text_id += 1;
            if let Some(dump_id) = dump_text_id {
                state.seen_text_ids.insert(dump_id, id);
            }
            (id, true)
        }
    };

    if fresh {
        let text_row = TextRow {
            id: text_id,
            content: body,
            flags: DEFAULT_TEXT_FLAGS,
        };
        format_text_tuple(&text_row, tuple);
        outputs.text.push(tuple)?;
        stats.text_rows += 1;
    }

    let row = RevisionRow {
        id: stub.id,
        page_id: state.meta.id,
        text_id,
        comment: stub.comment,
        user_id: stub.user_id,
        user_text: stub.user_text,
        timestamp: stub.timestamp,
        minor: stub.minor,
        deleted,
        len,
        parent_id: stub.parent_id,
        sha1,
        model,
        format,
    };
    format_revision_tuple(version, &row, tuple);
    outputs.revision.push(tuple)?;
    stats.revisions += 1;

    state.rev_count += 1;
    state.latest_rev_id = row.id;
    state.latest_len = row.len;
    state.latest_timestamp = row.timestamp;
    state.latest_model = row.model;
    Ok(())
}

fn emit_page(
    state: PageState,
    version: MwVersion,
    outputs: &mut SqlOutputs,
    stats: &mut ConversionStats,
    tuple: &mut String,
) -> Result<()> {
    if state.rev_count == 0 {
        warn!(
            page_id = state.meta.id,
            title = %state.meta.title,
            "page without revisions, no row emitted"
        );
        return Ok(());
    }
    let row = PageRow {
        id: state.meta.id,
        namespace: state.meta.namespace,
        title: state.meta.title,
        restrictions: state.meta.restrictions,
        is_redirect: state.meta.is_redirect,
        is_new: state.rev_count == 1,
        random: rand::thread_rng().gen::<f64>(),
        touched: state.latest_timestamp,
        latest_rev_id: state.latest_rev_id,
        len: state.latest_len,
        content_model: state.latest_model,
    };
    format_page_tuple(version, &row, tuple);
    outputs.page.push(tuple)?;
    stats.pages += 1;
    if stats.pages % PROGRESS_INTERVAL == 0 {
        stats.log_progress();
    }
    Ok(())
}
