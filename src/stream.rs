//! Compression-aware byte streams, dispatched by filename suffix.
//!
//! Dumps arrive as plaintext, gzip or bzip2; the SQL output is compressed
//! the same way when the `--sql` prefix carries a matching suffix. Readers
//! and writers hide the codec behind ordinary `BufRead`/`Write` interfaces,
//! so the rest of the pipeline never branches on compression.

use crate::config::READ_BUF_SIZE;
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Compression codec, inferred from a path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Bzip2,
}

impl Codec {
    pub fn from_path(path: &Path) -> Codec {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Codec::Gzip,
            Some("bz2") => Codec::Bzip2,
            _ => Codec::Plain,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Codec::Plain => "",
            Codec::Gzip => ".gz",
            Codec::Bzip2 => ".bz2",
        }
    }
}

/// Open a dump file for reading, decompressing per its suffix.
///
/// Wikimedia ships multistream archives, so the multi-member decoder
/// variants are used for both codecs.
pub fn open_read(path: &Path) -> Result<Box<dyn BufRead>> {
    let file =
        File::open(path).with_context(|| format!("failed to open input: {}", path.display()))?;
    Ok(match Codec::from_path(path) {
        Codec::Plain => Box::new(BufReader::with_capacity(READ_BUF_SIZE, file)),
        Codec::Gzip => Box::new(BufReader::with_capacity(
            READ_BUF_SIZE,
            MultiGzDecoder::new(file),
        )),
        Codec::Bzip2 => Box::new(BufReader::with_capacity(
            READ_BUF_SIZE,
            MultiBzDecoder::new(file),
        )),
    })
}

/// A writable SQL stream with explicit compression finalisation.
///
/// `finish` is called on the success path only; a writer dropped mid-run
/// leaves a truncated file behind, which is the documented behavior for
/// fatal errors (no half-written statement is ever completed).
pub enum SqlWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
}

impl SqlWriter {
    pub fn create(path: &Path) -> Result<SqlWriter> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output: {}", path.display()))?;
        let buf = BufWriter::new(file);
        Ok(match Codec::from_path(path) {
            Codec::Plain => SqlWriter::Plain(buf),
            Codec::Gzip => SqlWriter::Gzip(GzEncoder::new(buf, flate2::Compression::default())),
            Codec::Bzip2 => SqlWriter::Bzip2(BzEncoder::new(buf, bzip2::Compression::default())),
        })
    }

    /// Flush buffered data and write the compression trailer.
    pub fn finish(self) -> Result<()> {
        match self {
            SqlWriter::Plain(mut w) => w.flush().context("failed to flush output")?,
            SqlWriter::Gzip(w) => {
                let mut inner = w.finish().context("failed to finish gzip stream")?;
                inner.flush().context("failed to flush output")?;
            }
            SqlWriter::Bzip2(w) => {
                let mut inner = w.finish().context("failed to finish bzip2 stream")?;
                inner.flush().context("failed to flush output")?;
            }
        }
        Ok(())
    }
}

impl Write for SqlWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            SqlWriter::Plain(w) => w.write(buf),
            SqlWriter::Gzip(w) => w.write(buf),
            SqlWriter::Bzip2(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            SqlWriter::Plain(w) => w.flush(),
            SqlWriter::Gzip(w) => w.flush(),
            SqlWriter::Bzip2(w) => w.flush(),
        }
    }
}

/// Derive the output path for one table from the `--sql` prefix.
///
/// The table name is spliced in front of the `.sql` suffix so the codec
/// suffix stays outermost: `dump.sql.gz` becomes `dump-page.sql.gz`, and a
/// bare `dump` becomes `dump-page.sql`.
pub fn table_path(prefix: &str, table: &str) -> PathBuf {
    let (stem, codec) = match prefix.strip_suffix(".gz") {
        Some(stem) => (stem, Codec::Gzip),
        None => match prefix.strip_suffix(".bz2") {
            Some(stem) => (stem, Codec::Bzip2),
            None => (prefix, Codec::Plain),
        },
    };
    let stem = stem.strip_suffix(".sql").unwrap_or(stem);
    PathBuf::from(format!("{}-{}.sql{}", stem, table, codec.suffix()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn codec_from_suffix() {
        assert_eq!(Codec::from_path(Path::new("dump.xml")), Codec::Plain);
        assert_eq!(Codec::from_path(Path::new("dump.xml.gz")), Codec::Gzip);
        assert_eq!(Codec::from_path(Path::new("dump.xml.bz2")), Codec::Bzip2);
        assert_eq!(Codec::from_path(Path::new("dump")), Codec::Plain);
        assert_eq!(Codec::from_path(Path::new("dump.bz2.xml")), Codec::Plain);
    }

    #[test]
    fn table_paths_from_prefix() {
        assert_eq!(
            table_path("dump.sql.gz", "page"),
            PathBuf::from("dump-page.sql.gz")
        );
        assert_eq!(
            table_path("dump.sql.bz2", "revision"),
            PathBuf::from("dump-revision.sql.bz2")
        );
        assert_eq!(table_path("dump.sql", "text"), PathBuf::from("dump-text.sql"));
        assert_eq!(table_path("dump", "page"), PathBuf::from("dump-page.sql"));
        assert_eq!(
            table_path("out/enwiki.gz", "text"),
            PathBuf::from("out/enwiki-text.sql.gz")
        );
    }

    fn roundtrip(name: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);

        let mut writer = SqlWriter::create(&path).unwrap();
        writer.write_all(b"INSERT INTO `text` VALUES (1,'x','utf-8');\n").unwrap();
        writer.finish().unwrap();

        let mut reader = open_read(&path).unwrap();
        let mut contents = String::new();
        reader.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "INSERT INTO `text` VALUES (1,'x','utf-8');\n");
    }

    #[test]
    fn plain_roundtrip() {
        roundtrip("out.sql");
    }

    #[test]
    fn gzip_roundtrip() {
        roundtrip("out.sql.gz");
    }

    #[test]
    fn bzip2_roundtrip() {
        roundtrip("out.sql.bz2");
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(open_read(Path::new("/nonexistent/dump.xml.bz2")).is_err());
    }
}
