//! MySQL literal encoding and multi-row INSERT batching.

use crate::config::STATEMENT_CAP;
use crate::stream::{self, SqlWriter};
use anyhow::{Context, Result};
use std::io::Write;

/// Escape a string into a MySQL literal body, mysqldump style.
///
/// The target string receives the escaped bytes without surrounding quotes.
pub fn escape_into(src: &str, out: &mut String) {
    for c in src.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            _ => out.push(c),
        }
    }
}

/// A single column value, rendered into a tuple by [`push_value`].
pub enum SqlValue<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
    Null,
}

/// Append one value to a tuple under construction.
pub fn push_value(out: &mut String, value: SqlValue<'_>) {
    match value {
        SqlValue::Int(v) => {
            out.push_str(&v.to_string());
        }
        SqlValue::UInt(v) => {
            out.push_str(&v.to_string());
        }
        SqlValue::Float(v) => {
            out.push_str(&v.to_string());
        }
        SqlValue::Str(v) => {
            out.push('\'');
            escape_into(v, out);
            out.push('\'');
        }
        SqlValue::Null => out.push_str("NULL"),
    }
}

/// Accumulates row tuples for one table and emits multi-row INSERTs.
///
/// A statement is flushed before it would exceed the soft cap, and once
/// more at `finish`. Statements are separated by a blank line.
pub struct InsertBatcher {
    writer: SqlWriter,
    header: String,
    tuples: String,
    cap: usize,
    statements: u64,
}

impl InsertBatcher {
    pub fn new(writer: SqlWriter, table: &str) -> InsertBatcher {
        InsertBatcher::with_cap(writer, table, STATEMENT_CAP)
    }

    pub fn with_cap(writer: SqlWriter, table: &str, cap: usize) -> InsertBatcher {
        InsertBatcher {
            writer,
            header: format!("INSERT INTO `{}` VALUES ", table),
            tuples: String::new(),
            cap,
            statements: 0,
        }
    }

    /// Queue one `(v1,v2,…)` tuple, flushing first if the statement would
    /// outgrow the cap.
    pub fn push(&mut self, tuple: &str) -> Result<()> {
        let projected = self.header.len() + self.tuples.len() + 1 + tuple.len() + 2;
        if !self.tuples.is_empty() && projected > self.cap {
            self.flush()?;
        }
        if !self.tuples.is_empty() {
            self.tuples.push(',');
        }
        self.tuples.push_str(tuple);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.tuples.is_empty() {
            return Ok(());
        }
        if self.statements > 0 {
            self.writer
                .write_all(b"\n")
                .context("failed to write statement separator")?;
        }
        self.writer
            .write_all(self.header.as_bytes())
            .context("failed to write INSERT header")?;
        self.writer
            .write_all(self.tuples.as_bytes())
            .context("failed to write INSERT rows")?;
        self.writer
            .write_all(b";\n")
            .context("failed to terminate INSERT statement")?;
        self.tuples.clear();
        self.statements += 1;
        Ok(())
    }

    /// Flush the pending statement and finalise the compressed stream.
    pub fn finish(mut self) -> Result<()> {
        self.flush()?;
        self.writer.finish()
    }
}

/// The three per-table output streams of a conversion run.
pub struct SqlOutputs {
    pub page: InsertBatcher,
    pub revision: InsertBatcher,
    pub text: InsertBatcher,
}

impl SqlOutputs {
    /// Create `<prefix>-page.sql`, `<prefix>-revision.sql` and
    /// `<prefix>-text.sql`, compressed per the prefix suffix.
    pub fn create(prefix: &str) -> Result<SqlOutputs> {
        let open = |table: &str| -> Result<InsertBatcher> {
            let path = stream::table_path(prefix, table);
            Ok(InsertBatcher::new(SqlWriter::create(&path)?, table))
        };
        Ok(SqlOutputs {
            page: open("page")?,
            revision: open("revision")?,
            text: open("text")?,
        })
    }

    pub fn finish(self) -> Result<()> {
        self.page.finish()?;
        self.revision.finish()?;
        self.text.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn escaped(src: &str) -> String {
        let mut out = String::new();
        escape_into(src, &mut out);
        out
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escaped("Main Page"), "Main Page");
        assert_eq!(escaped("日本語"), "日本語");
    }

    #[test]
    fn quotes_and_backslashes() {
        assert_eq!(escaped("it's"), "it\\'s");
        assert_eq!(escaped(r"a\b"), "a\\\\b");
        assert_eq!(escaped("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn control_characters() {
        assert_eq!(escaped("a\nb"), "a\\nb");
        assert_eq!(escaped("a\rb"), "a\\rb");
        assert_eq!(escaped("a\0b"), "a\\0b");
        assert_eq!(escaped("a\x1ab"), "a\\Zb");
    }

    #[test]
    fn escaper_is_total() {
        // every char maps to something; tabs and other controls pass through
        assert_eq!(escaped("a\tb"), "a\tb");
        assert_eq!(escaped("\u{7f}"), "\u{7f}");
    }

    #[test]
    fn value_rendering() {
        let mut out = String::new();
        push_value(&mut out, SqlValue::UInt(7));
        out.push(',');
        push_value(&mut out, SqlValue::Int(-2));
        out.push(',');
        push_value(&mut out, SqlValue::Str("O'Brien"));
        out.push(',');
        push_value(&mut out, SqlValue::Null);
        assert_eq!(out, "7,-2,'O\\'Brien',NULL");
    }

    #[test]
    fn float_rendering() {
        let mut out = String::new();
        push_value(&mut out, SqlValue::Float(0.5));
        assert_eq!(out, "0.5");
    }

    fn read_sql(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[test]
    fn batcher_single_statement() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one-text.sql");
        let mut batcher = InsertBatcher::new(SqlWriter::create(&path).unwrap(), "text");
        batcher.push("(1,'a','utf-8')").unwrap();
        batcher.push("(2,'b','utf-8')").unwrap();
        batcher.finish().unwrap();

        assert_eq!(
            read_sql(&dir, "one-text.sql"),
            "INSERT INTO `text` VALUES (1,'a','utf-8'),(2,'b','utf-8');\n"
        );
    }

    #[test]
    fn batcher_splits_at_cap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("split-text.sql");
        let mut batcher = InsertBatcher::with_cap(SqlWriter::create(&path).unwrap(), "text", 64);
        for i in 0..6 {
            batcher.push(&format!("({},'xxxxxxxxxx','utf-8')", i)).unwrap();
        }
        batcher.finish().unwrap();

        let sql = read_sql(&dir, "split-text.sql");
        let statements: Vec<&str> = sql.split("\n\n").collect();
        assert!(statements.len() > 1, "expected multiple statements: {sql}");
        for stmt in &statements {
            assert!(stmt.starts_with("INSERT INTO `text` VALUES ("));
            assert!(stmt.trim_end().ends_with(';'));
            assert!(stmt.len() <= 64 + 1, "statement over cap: {stmt}");
        }
        // all six rows survive the split
        assert_eq!(sql.matches("'xxxxxxxxxx'").count(), 6);
    }

    #[test]
    fn batcher_empty_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty-page.sql");
        let batcher = InsertBatcher::new(SqlWriter::create(&path).unwrap(), "page");
        batcher.finish().unwrap();
        assert_eq!(read_sql(&dir, "empty-page.sql"), "");
    }

    #[test]
    fn oversized_single_tuple_still_emitted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big-text.sql");
        let mut batcher = InsertBatcher::with_cap(SqlWriter::create(&path).unwrap(), "text", 32);
        let tuple = format!("(1,'{}','utf-8')", "y".repeat(100));
        batcher.push(&tuple).unwrap();
        batcher.finish().unwrap();
        let sql = read_sql(&dir, "big-text.sql");
        assert!(sql.contains(&"y".repeat(100)));
        assert_eq!(sql.matches("INSERT INTO").count(), 1);
    }

    #[test]
    fn outputs_create_all_three_tables() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("wiki.sql");
        let outputs = SqlOutputs::create(prefix.to_str().unwrap()).unwrap();
        outputs.finish().unwrap();
        for table in ["page", "revision", "text"] {
            assert!(dir.path().join(format!("wiki-{}.sql", table)).exists());
        }
    }
}
