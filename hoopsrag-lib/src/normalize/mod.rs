//! Turning box-score rows into natural-language documents
//!
//! Each valid row becomes one [`NormalizedDocument`]: a sentence describing
//! the game, rendered by a [`Template`], plus optional structured metadata.
//!
//! Rows that fail validation are dropped and reported in
//! [`Normalized::skipped`]; a malformed row never aborts the batch.
//!
//! # Implementing a Template
//!
//! ```ignore
//! use hoopsrag_lib::normalize::{Language, Template};
//! use hoopsrag_lib::record::GameLine;
//!
//! struct Terse;
//!
//! impl Template for Terse {
//!     fn name(&self) -> &str { "terse" }
//!     fn language(&self) -> Language { Language::English }
//!     fn render(&self, line: &GameLine) -> String {
//!         format!("{}: {} pts", line.player, line.points)
//!     }
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::record::{GameLine, RawTable, RowSkip};
use crate::Error;

/// A document ready for embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedDocument {
    /// Hash of the text
    pub id: String,
    /// Natural-language description of one game line
    pub text: String,
    /// Structured fields, when metadata is enabled
    pub metadata: Option<DocumentMetadata>,
}

impl NormalizedDocument {
    /// Create a document, deriving its id from the text.
    pub fn new(text: impl Into<String>, metadata: Option<DocumentMetadata>) -> Self {
        let text = text.into();
        Self {
            id: generate_id(&text),
            text,
            metadata,
        }
    }
}

/// Structured fields carried next to the text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub player: String,
    pub team: String,
    pub date: String,
    pub points: f64,
    /// Source row, 1-based
    pub row: usize,
}

impl From<&GameLine> for DocumentMetadata {
    fn from(line: &GameLine) -> Self {
        Self {
            player: line.player.clone(),
            team: line.team.clone(),
            date: line.date.clone(),
            points: line.points.value(),
            row: line.row,
        }
    }
}

/// Language used for documents and prompts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// The sentence template for this language
    #[must_use]
    pub fn template(self) -> Box<dyn Template> {
        match self {
            Language::Turkish => Box::new(TurkishTemplate),
            Language::English => Box::new(EnglishTemplate),
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::Turkish => "tr",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" | "turkish" => Ok(Language::Turkish),
            "en" | "english" => Ok(Language::English),
            other => Err(Error::InvalidInput(format!("unknown language: {other}"))),
        }
    }
}

/// Sentence template for one game line
///
/// Numeric fields must be rendered with the precision of the source value.
pub trait Template: Send + Sync {
    /// Render the description of one game line
    fn render(&self, line: &GameLine) -> String;

    /// Language the template writes in
    fn language(&self) -> Language;

    /// Returns the name of this template
    fn name(&self) -> &str;
}

/// Output of [`normalize`]
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// One document per valid row, in input order
    pub documents: Vec<NormalizedDocument>,
    /// Rows that were dropped, including those the CSV layer could not decode
    pub skipped: Vec<RowSkip>,
}

/// Convert every valid row of `table` into a document.
pub fn normalize(table: &RawTable, template: &dyn Template, with_metadata: bool) -> Normalized {
    let mut documents = Vec::with_capacity(table.records.len());
    let mut skipped = table.skipped.clone();

    for record in &table.records {
        match GameLine::try_from(record) {
            Ok(line) => {
                let metadata = with_metadata.then(|| DocumentMetadata::from(&line));
                documents.push(NormalizedDocument::new(template.render(&line), metadata));
            }
            Err(skip) => {
                let error = Error::from(skip.clone());
                warn!(%error, "skipping row");
                skipped.push(skip);
            }
        }
    }

    skipped.sort_by_key(|s| s.row);
    debug!(
        documents = documents.len(),
        skipped = skipped.len(),
        template = template.name(),
        "normalized table"
    );

    Normalized { documents, skipped }
}

fn generate_id(string: &str) -> String {
    let mut hasher = DefaultHasher::new();
    string.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

mod english;
mod turkish;

pub use english::*;
pub use turkish::*;
