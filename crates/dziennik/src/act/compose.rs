//! Post composition.

use super::tables::Tables;
use super::title::TitleTransformer;
use super::types::{ActReference, TweetDraft};

/// Public gazette site.
pub const DEFAULT_BASE_URL: &str = "https://dziennikustaw.gov.pl";

/// Link to an act's PDF: `{base}/D{year}{number:03}{position:04}01.pdf`.
#[must_use]
pub fn pdf_url(base_url: &str, reference: ActReference) -> String {
    format!(
        "{}/D{}{:03}{:04}01.pdf",
        base_url.trim_end_matches('/'),
        reference.year,
        reference.number,
        reference.position
    )
}

/// First line of a post, e.g. `Dz.U. 2020 poz. 2146`.
///
/// Milestone positions are rendered with their glyph instead of digits.
#[must_use]
pub fn citation_line(reference: ActReference, tables: &Tables) -> String {
    match tables.milestone_glyph(reference.position) {
        Some(glyph) => format!("Dz.U. {} poz. {glyph}", reference.year),
        None => reference.to_string(),
    }
}

/// Builds three-line posts for acts.
#[derive(Debug, Clone)]
pub struct PostComposer {
    transformer: TitleTransformer,
    base_url: String,
}

impl PostComposer {
    /// Create a composer linking to `base_url`.
    #[must_use]
    pub fn new(transformer: TitleTransformer, base_url: impl Into<String>) -> Self {
        Self {
            transformer,
            base_url: base_url.into(),
        }
    }

    /// Tables used for titles and citation lines.
    #[must_use]
    pub fn tables(&self) -> &Tables {
        self.transformer.tables()
    }

    /// Compose a draft without media.
    #[must_use]
    pub fn compose(&self, reference: ActReference, title: &str) -> TweetDraft {
        TweetDraft {
            citation_line: citation_line(reference, self.tables()),
            title_line: self.transformer.transform(title),
            url_line: pdf_url(&self.base_url, reference),
            media_ids: Vec::new(),
        }
    }

    /// Compose the post text directly.
    #[must_use]
    pub fn compose_text(&self, year: u32, number: u32, position: u32, title: &str) -> String {
        self.compose(ActReference::new(year, number, position), title)
            .text()
    }
}
