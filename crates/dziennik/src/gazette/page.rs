//! Act page HTML parsing.

use scraper::{Html, Selector};

/// Extract the act title: the first text inside the page's first `<h2>`.
///
/// Returns `None` for pages without a heading (e.g. the site's 404 page).
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let heading_selector = Selector::parse("h2").expect("Invalid heading selector");

    let heading = document.select(&heading_selector).next()?;
    heading
        .text()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(ToString::to_string)
}
