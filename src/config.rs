/// Read buffer size for decompressed XML input.
pub const READ_BUF_SIZE: usize = 1024 * 1024;

/// Soft cap on the encoded size of a single INSERT statement.
pub const STATEMENT_CAP: usize = 1024 * 1024;

/// Abort the join after scanning this many content revisions without a match.
pub const DESYNC_TOLERANCE: u32 = 1000;

/// Progress update interval (log every N pages).
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Width of the zero-padded base-36 SHA-1 stored in rev_sha1.
pub const SHA1_BASE36_WIDTH: usize = 31;

/// Flags stored in text.old_flags for every emitted text row.
pub const DEFAULT_TEXT_FLAGS: &str = "utf-8";

/// First text.old_id assigned when --startid is not given.
pub const DEFAULT_START_TEXT_ID: u32 = 1;

/// Oldest export schema version the parser accepts, as (major, minor).
pub const MIN_SCHEMA_VERSION: (u32, u32) = (0, 5);

/// Newest export schema version the parser accepts, as (major, minor).
pub const MAX_SCHEMA_VERSION: (u32, u32) = (0, 10);
