//! Act data types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// First year in which positions alone identify an act.
///
/// Older acts were numbered per issue and need the legacy `Nr` as well.
pub const LEGACY_CUTOFF_YEAR: u32 = 2012;

/// A reference to a single act in the Journal of Laws.
///
/// Zero means "absent" for every field, so `ActReference::default()` is what
/// the citation parser yields for text without a citation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActReference {
    /// Publication year.
    pub year: u32,
    /// Legacy issue number (`Nr`), only meaningful before 2012.
    pub number: u32,
    /// 1-based position within the year.
    pub position: u32,
}

impl ActReference {
    /// Create a new reference.
    #[must_use]
    pub const fn new(year: u32, number: u32, position: u32) -> Self {
        Self {
            year,
            number,
            position,
        }
    }

    /// Whether a position was recognized.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.position > 0
    }

    /// Pre-2012 acts without a legacy number cannot be identified.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.year < LEGACY_CUTOFF_YEAR && self.number == 0
    }
}

/// Canonical citation text, e.g. `Dz.U. 2020 poz. 2146`.
impl fmt::Display for ActReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dz.U. {} poz. {}", self.year, self.position)
    }
}

/// An act fetched from the gazette for one discovery iteration.
#[derive(Debug, Clone)]
pub struct GazetteAct {
    /// Which act this is.
    pub reference: ActReference,
    /// Raw title scraped from the act page.
    pub title: String,
    /// The act's PDF document.
    pub pdf: Vec<u8>,
    /// Number of pages in the PDF.
    pub page_count: usize,
}

/// A composed post, ready to be published once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetDraft {
    /// `Dz.U. {year} poz. {position}`, persisted as the marker after posting.
    pub citation_line: String,
    /// Title after handle substitution, emoji prefixing and truncation.
    pub title_line: String,
    /// Link to the act's PDF.
    pub url_line: String,
    /// Uploaded media ids, in page order.
    pub media_ids: Vec<String>,
}

impl TweetDraft {
    /// The full post text: three lines joined by `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        [
            self.citation_line.as_str(),
            self.title_line.as_str(),
            self.url_line.as_str(),
        ]
        .join("\n")
    }

    /// Attach uploaded media.
    #[must_use]
    pub fn with_media(mut self, media_ids: Vec<String>) -> Self {
        self.media_ids = media_ids;
        self
    }
}
