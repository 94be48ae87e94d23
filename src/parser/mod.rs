pub mod detail;
pub mod listing;
pub mod merge;
pub mod normalize;

use scraper::ElementRef;

/// Concatenated text of an element and its descendants, trimmed.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
