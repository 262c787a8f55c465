//! Gazette site access: act pages, PDFs and page rendering.

mod client;
mod page;
mod render;

pub use client::{ActSource, GazetteClient, GazetteConfig};
pub use page::extract_title;
pub use render::{PageRenderer, PdfRenderer, PAGE_MEDIA_TYPE};
