//! Minos: MediaWiki XML dump to MySQL SQL transducer
//!
//! This crate converts a pair of MediaWiki XML dumps -- a *stub* dump with
//! page and revision metadata, and a *content* dump with revision text --
//! into multi-row `INSERT` statements for the `page`, `revision` and `text`
//! tables of a MediaWiki MySQL schema.
//!
//! The two dumps are traversed simultaneously and joined on revision id,
//! with the stub stream as the spine. Neither stream is ever loaded into
//! memory: the working set is one revision per stream plus one page's
//! metadata, regardless of dump size.
//!
//! # Pipeline
//!
//! ```text
//! {stub.xml, content.xml}
//!     -> stream   (suffix-dispatched plain/gzip/bzip2 readers)
//!     -> parser   (quick-xml pull events -> typed page/revision records)
//!     -> join     (dual-stream merge, text id allocation, SHA-1 derivation)
//!     -> schema   (per-MediaWiki-version column policy)
//!     -> sql      (MySQL escaping, 1 MiB multi-row INSERT batching)
//!     -> stream   (suffix-dispatched plain/gzip/bzip2 writers)
//! -> {prefix-page.sql, prefix-revision.sql, prefix-text.sql}
//! ```
//!
//! # Key Modules
//!
//! - [`stream`] -- Compression-aware byte streams, chosen by file suffix
//! - [`parser`] -- Streaming MediaWiki export parser (schema 0.5-0.10)
//! - [`join`] -- The dual-stream join driver
//! - [`schema`] -- Column sets per target MediaWiki version (1.5-1.29)
//! - [`sql`] -- MySQL literal escaping and INSERT batching
//! - [`digest`] -- Base-36 SHA-1 derivation for rev_sha1
//! - [`models`] -- Core record and row types
//! - [`stats`] -- Run counters and summary reporting
//! - [`error`] -- Failure classification and exit codes
//! - [`config`] -- Buffer sizes, caps and tolerances
//!
//! # Behavior notes
//!
//! - Inputs and outputs may be plaintext, gzip or bzip2, independently.
//! - Stub revisions without a content counterpart are emitted with empty
//!   text; content revisions without a stub counterpart are discarded.
//!   Both cases are counted and reported.
//! - Duplicate text ids in buggy dumps are tolerated: the first occurrence
//!   wins, later revisions reference its row.
//! - Malformed single records are skipped and counted; framing problems
//!   (bad XML, bad compression, I/O) abort the run.

pub mod config;
pub mod digest;
pub mod error;
pub mod join;
pub mod models;
pub mod parser;
pub mod schema;
pub mod sql;
pub mod stats;
pub mod stream;
