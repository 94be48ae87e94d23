use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use super::normalize::{format_formula, normalize_categories, normalize_empty};
use super::text_of;
use crate::error::ScrapeError;
use crate::records::ListingRow;

pub const LISTING_TABLE_ID: &str = "drugs-table";

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("table#{}", LISTING_TABLE_ID)).unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Columns read from each row: name/link, weight+formula, (structure), description, categories.
const MIN_CELLS: usize = 5;

/// Parse every data row of the listing table on one page, in table order.
pub fn extract_rows(html: &str, page: u32, origin: &Url) -> Result<Vec<ListingRow>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table = doc.select(&TABLE).next().ok_or(ScrapeError::MissingTable {
        page,
        table_id: LISTING_TABLE_ID,
    })?;

    let mut rows = Vec::new();
    // First row is the column header
    for (idx, tr) in table.select(&ROW).enumerate().skip(1) {
        if let Some(row) = extract_row(tr, page, idx, origin)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// One `<tr>` → partial record. `Ok(None)` for rows without data cells.
pub fn extract_row(
    tr: ElementRef<'_>,
    page: u32,
    idx: usize,
    origin: &Url,
) -> Result<Option<ListingRow>, ScrapeError> {
    let cells: Vec<ElementRef<'_>> = tr.select(&CELL).collect();
    if cells.is_empty() {
        return Ok(None);
    }
    if cells.len() < MIN_CELLS {
        return Err(ScrapeError::ShortListingRow {
            page,
            row: idx,
            found: cells.len(),
        });
    }

    let molecule = text_of(cells[0]);
    let link = cells[0]
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| resolve_link(origin, href))
        .transpose()?;
    let slug = link.as_ref().and_then(slug_of);

    let (weight, formula) = split_weight_formula(cells[1]);
    if weight.is_empty() {
        warn!(page, row = idx, molecule = %molecule, "empty weight/formula column");
    }

    Ok(Some(ListingRow {
        page,
        molecule,
        link,
        slug,
        weight,
        formula,
        description: normalize_empty(&text_of(cells[3])),
        categories: normalize_categories(&text_of(cells[4])),
    }))
}

fn resolve_link(origin: &Url, href: &str) -> Result<Url, ScrapeError> {
    origin.join(href).map_err(|source| ScrapeError::InvalidLink {
        href: href.to_string(),
        source,
    })
}

fn slug_of(link: &Url) -> Option<String> {
    link.path_segments()?
        .rev()
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Weight is the first token of the cell; everything after it is the formula.
/// An empty cell yields two empty strings.
fn split_weight_formula(cell: ElementRef<'_>) -> (String, String) {
    let joined = cell.text().collect::<Vec<_>>().join(" ");
    let mut tokens = joined.split_whitespace();
    let weight = tokens.next().unwrap_or_default().to_string();
    let formula = format_formula(&tokens.collect::<Vec<_>>().join(" "));
    (weight, formula)
}

// ── Tests ──
