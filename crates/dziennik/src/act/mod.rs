//! Acts of the Journal of Laws: citations, titles and post composition.

mod citation;
mod compose;
mod tables;
mod title;
mod types;

pub use citation::parse_citation;
pub use compose::{citation_line, pdf_url, PostComposer, DEFAULT_BASE_URL};
pub use tables::{Milestone, Tables};
pub use title::{truncate_words, TitleTransformer, ELLIPSIS, MAX_TITLE_LENGTH};
pub use types::{ActReference, GazetteAct, TweetDraft, LEGACY_CUTOFF_YEAR};
