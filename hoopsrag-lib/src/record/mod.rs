//! Reading box-score rows from delimited text files
//!
//! The statistics export is a semicolon-delimited file with a header row.
//! Header names often carry stray whitespace (`" PTS"`), so headers are
//! trimmed before any field lookup.
//!
//! Reading is split in two stages:
//! - [`RawTable`]: every decodable row as a [`RawRecord`] of optional strings
//! - [`GameLine`]: a row validated once, with parsed numeric fields
//!
//! # Usage
//!
//! ```ignore
//! use hoopsrag_lib::record::{read_table, GameLine};
//!
//! let table = read_table("nba_fantasy_dataset.csv", b';')?;
//! for record in &table.records {
//!     match GameLine::try_from(record) {
//!         Ok(line) => println!("{} scored {}", line.player, line.points),
//!         Err(skip) => eprintln!("{skip}"),
//!     }
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Column names every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "Player", "Tm", "Data", "Opp", "MP", "PTS", "TRB", "AST", "STL", "BLK", "FG%",
];

/// One input row, exactly as found in the file.
///
/// Every field is optional here; [`GameLine`] decides what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based row number, header excluded
    #[serde(skip)]
    pub row: usize,
    #[serde(rename = "Player")]
    pub player: Option<String>,
    #[serde(rename = "Tm")]
    pub team: Option<String>,
    #[serde(rename = "Data")]
    pub date: Option<String>,
    #[serde(rename = "Opp")]
    pub opponent: Option<String>,
    #[serde(rename = "MP")]
    pub minutes: Option<String>,
    #[serde(rename = "PTS")]
    pub points: Option<String>,
    #[serde(rename = "TRB")]
    pub rebounds: Option<String>,
    #[serde(rename = "AST")]
    pub assists: Option<String>,
    #[serde(rename = "STL")]
    pub steals: Option<String>,
    #[serde(rename = "BLK")]
    pub blocks: Option<String>,
    #[serde(rename = "FG%")]
    pub field_goal_pct: Option<String>,
}

/// A row that was dropped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSkip {
    pub row: usize,
    pub reason: String,
}

impl RowSkip {
    pub fn new(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} skipped: {}", self.row, self.reason)
    }
}

impl From<RowSkip> for Error {
    fn from(skip: RowSkip) -> Self {
        Error::RowParse {
            row: skip.row,
            reason: skip.reason,
        }
    }
}

/// All rows of one input file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Trimmed header names, in file order
    pub headers: Vec<String>,
    /// Rows the CSV layer could decode, in file order
    pub records: Vec<RawRecord>,
    /// Rows the CSV layer could not decode at all
    pub skipped: Vec<RowSkip>,
    /// Hex digest of the raw file contents
    pub fingerprint: String,
}

impl RawTable {
    /// Parse a table from any reader.
    ///
    /// Only an unreadable header is an error. Undecodable rows are recorded
    /// in [`RawTable::skipped`] and reading continues.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::InvalidInput(format!("unreadable header row: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let missing = missing_columns(&headers);
        if !missing.is_empty() {
            warn!(?missing, "input is missing required columns, affected rows will be skipped");
        }

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (i, result) in reader.deserialize::<RawRecord>().enumerate() {
            let row = i + 1;
            match result {
                Ok(mut record) => {
                    record.row = row;
                    records.push(record);
                }
                Err(e) => {
                    let skip = RowSkip::new(row, e.to_string());
                    let error = Error::from(skip.clone());
                    warn!(%error, "skipping undecodable row");
                    skipped.push(skip);
                }
            }
        }

        debug!(rows = records.len(), skipped = skipped.len(), "read table");

        Ok(Self {
            headers,
            records,
            skipped,
            fingerprint: String::new(),
        })
    }

    /// Parse a table held in memory.
    pub fn from_bytes(bytes: &[u8], delimiter: u8) -> Result<Self> {
        let mut table = Self::from_reader(bytes, delimiter)?;
        table.fingerprint = fingerprint(bytes);
        Ok(table)
    }
}

/// Read a delimited statistics file.
///
/// Fails with [`Error::FileAccess`] when the file cannot be read or its
/// header row cannot be decoded.
pub fn read_table(path: impl AsRef<Path>, delimiter: u8) -> Result<RawTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "loaded statistics file");

    RawTable::from_bytes(&bytes, delimiter).map_err(|e| match e {
        Error::InvalidInput(reason) => Error::FileAccess {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, reason),
        },
        other => other,
    })
}

/// Required columns absent from `headers`.
pub fn missing_columns(headers: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == column))
        .collect()
}

fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

mod game;

pub use game::*;
