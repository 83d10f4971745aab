//! Bulk load and dump of a [SkipIndex](SkipIndex) as delimiter-separated
//! text, one `key:value` entry per line.
//!
//! The format is deliberately permissive on the way in: lines that are
//! empty, lack the delimiter, or carry an empty key or value are skipped
//! without an error, as are lines whose halves fail to parse. Keys must not
//! contain the delimiter; values may, since the split happens at the first
//! occurrence only.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, trace};

use crate::skiplist::SkipIndex;

/// Delimiter used by [LineFormat::default](LineFormat::default).
pub const DEFAULT_DELIMITER: char = ':';

/// Failures surfaced by the persistence adapter. Malformed input lines are
/// not among them; those are skipped.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// The line format of the flat store file: a single-character delimiter
/// between the key text and the value text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    delimiter: char,
}

impl Default for LineFormat {
    fn default() -> Self {
        LineFormat::new(DEFAULT_DELIMITER)
    }
}

impl LineFormat {
    pub fn new(delimiter: char) -> Self {
        LineFormat { delimiter }
    }

    /// Splits a line at the first delimiter. `None` for lines the loader
    /// skips: no delimiter, empty key, or empty value.
    fn split<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let (key, value) = line.split_once(self.delimiter)?;
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some((key, value))
    }

    /// Parses one line into a key-value pair, or `None` if the line is
    /// malformed or either half fails textual conversion.
    pub(crate) fn parse<K, V>(&self, line: &str) -> Option<(K, V)>
    where
        K: FromStr,
        V: FromStr,
    {
        let (key, value) = self.split(line)?;
        Some((key.parse().ok()?, value.parse().ok()?))
    }

    /// Writes every entry to `writer` in ascending key order, one line per
    /// entry, and flushes after the full pass. Best effort: a failure mid-way
    /// leaves a truncated file behind.
    pub fn dump<K, V, W>(&self, index: &SkipIndex<K, V>, mut writer: W) -> Result<(), StoreError>
    where
        K: Ord + Display,
        V: Display,
        W: Write,
    {
        for (key, value) in index.entries() {
            writeln!(writer, "{}{}{}", key, self.delimiter, value)?;
        }
        writer.flush()?;

        debug!(entries = index.len(), "dumped index");
        Ok(())
    }

    /// Reads `reader` line by line and inserts every well-formed pair into
    /// `index`. Keys already present keep their value, so of duplicate lines
    /// the earliest wins. Returns how many entries were actually inserted.
    pub fn load<K, V, R>(&self, index: &mut SkipIndex<K, V>, reader: R) -> Result<usize, StoreError>
    where
        K: Ord + FromStr,
        V: FromStr,
        R: BufRead,
    {
        let mut inserted = 0;

        for line in reader.lines() {
            let line = line?;
            match self.parse(&line) {
                Some((key, value)) => {
                    if index.insert(key, value) {
                        inserted += 1;
                    } else {
                        trace!(line = %line, "skipping line for existing key");
                    }
                }
                None => trace!(line = %line, "skipping malformed line"),
            }
        }

        debug!(entries = inserted, "loaded index");
        Ok(inserted)
    }

    /// [dump](LineFormat::dump) into a freshly created file at `path`.
    pub fn dump_path<K, V, P>(&self, index: &SkipIndex<K, V>, path: P) -> Result<(), StoreError>
    where
        K: Ord + Display,
        V: Display,
        P: AsRef<Path>,
    {
        self.dump(index, BufWriter::new(File::create(path)?))
    }

    /// [load](LineFormat::load) from the file at `path`. A missing file is
    /// an [StoreError::Io](StoreError::Io), not an empty list; callers who
    /// want the permissive behavior can ignore the error.
    pub fn load_path<K, V, P>(&self, index: &mut SkipIndex<K, V>, path: P) -> Result<usize, StoreError>
    where
        K: Ord + FromStr,
        V: FromStr,
        P: AsRef<Path>,
    {
        self.load(index, BufReader::new(File::open(path)?))
    }
}
