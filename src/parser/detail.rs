//! Detail page extraction.
//!
//! Every field on a drug page lives in a `<dl>` as a `<dt id="…">` term followed
//! by a `<dd>` value. [`FIELDS`] maps each term id to how its value is read and
//! where it lands in [`DetailData`]; [`extract`] walks that table once per page.
//! Markup changes on the site should only ever touch the table and selectors here.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::normalize::normalize_empty;
use super::text_of;
use crate::error::ScrapeError;
use crate::records::{DetailData, MoaEntry};

pub const MOA_TABLE_ID: &str = "drug-moa-target-table";

static TERM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt[id]").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static MOA_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("table#{}", MOA_TABLE_ID)).unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Optional text fields of [`DetailData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Kind,
    Background,
    Summary,
    Indication,
    Pharmacodynamics,
    IupacName,
    Smiles,
    Groups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// Trimmed text of the whole value.
    Text,
    /// Trimmed text; placeholder values become None.
    Normalized,
    /// Trimmed text of the first `<p>` in the value; placeholders become None.
    FirstParagraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Text { term: &'static str, slot: Slot, read: Read },
    /// Every `<li>` in the value, in document order.
    ListItems { term: &'static str },
    /// The target table nested in the value.
    MoaTable { term: &'static str },
}

pub const FIELDS: &[Field] = &[
    Field::Text { term: "type", slot: Slot::Kind, read: Read::Text },
    Field::Text { term: "background", slot: Slot::Background, read: Read::Normalized },
    Field::Text { term: "summary", slot: Slot::Summary, read: Read::Text },
    Field::Text { term: "indication", slot: Slot::Indication, read: Read::FirstParagraph },
    Field::Text {
        term: "pharmacodynamics",
        slot: Slot::Pharmacodynamics,
        read: Read::Normalized,
    },
    Field::MoaTable { term: "mechanism-of-action" },
    Field::Text { term: "iupac-name", slot: Slot::IupacName, read: Read::Text },
    Field::Text { term: "smiles", slot: Slot::Smiles, read: Read::Text },
    Field::Text { term: "groups", slot: Slot::Groups, read: Read::Text },
    Field::ListItems { term: "synonyms" },
];

/// Parse one detail page. Absent terms leave their field None or empty;
/// only a malformed MoA row is an error.
pub fn extract(html: &str) -> Result<DetailData, ScrapeError> {
    let doc = Html::parse_document(html);
    let values = definitions(&doc);
    let value = |term: &str| values.get(term).copied().flatten();

    let mut data = DetailData::default();
    for field in FIELDS {
        match *field {
            Field::Text { term, slot, read } => {
                *slot_mut(&mut data, slot) = value(term).and_then(|dd| read_text(dd, read, term));
            }
            Field::ListItems { term } => {
                data.synonyms = value(term).map(list_items).unwrap_or_default();
            }
            Field::MoaTable { term } => {
                data.moa = match value(term) {
                    Some(dd) => moa_entries(dd)?,
                    None => Vec::new(),
                };
            }
        }
    }
    Ok(data)
}

/// Term id → the `<dd>` following the first `<dt>` carrying that id.
fn definitions(doc: &Html) -> HashMap<&str, Option<ElementRef<'_>>> {
    let mut map = HashMap::new();
    for dt in doc.select(&TERM) {
        let Some(id) = dt.value().id() else { continue };
        map.entry(id).or_insert_with(|| {
            dt.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "dd")
        });
    }
    map
}

fn slot_mut(data: &mut DetailData, slot: Slot) -> &mut Option<String> {
    match slot {
        Slot::Kind => &mut data.kind,
        Slot::Background => &mut data.background,
        Slot::Summary => &mut data.summary,
        Slot::Indication => &mut data.indication,
        Slot::Pharmacodynamics => &mut data.pharmacodynamics,
        Slot::IupacName => &mut data.iupac_name,
        Slot::Smiles => &mut data.smiles,
        Slot::Groups => &mut data.groups,
    }
}

fn read_text(dd: ElementRef<'_>, read: Read, term: &str) -> Option<String> {
    match read {
        Read::Text => Some(text_of(dd)),
        Read::Normalized => normalize_empty(&text_of(dd)),
        Read::FirstParagraph => match dd.select(&PARAGRAPH).next() {
            Some(p) => normalize_empty(&text_of(p)),
            None => {
                debug!(term, "value has no paragraph");
                None
            }
        },
    }
}

fn list_items(dd: ElementRef<'_>) -> Vec<String> {
    dd.select(&LIST_ITEM).map(text_of).collect()
}

fn moa_entries(dd: ElementRef<'_>) -> Result<Vec<MoaEntry>, ScrapeError> {
    let Some(table) = dd.select(&MOA_TABLE).next() else {
        return Ok(Vec::new());
    };

    table
        .select(&ROW)
        .enumerate()
        .skip(1)
        .map(|(idx, tr)| {
            let cells: Vec<String> = tr.select(&CELL).take(3).map(text_of).collect();
            match <[String; 3]>::try_from(cells) {
                Ok([target, actions, organism]) => Ok(MoaEntry {
                    target,
                    actions,
                    organism,
                }),
                Err(cells) => Err(ScrapeError::ShortMoaRow {
                    row: idx,
                    found: cells.len(),
                }),
            }
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><body><dl>{}</dl></body></html>", body)
    }

    fn aspirin() -> DetailData {
        let html = std::fs::read_to_string("tests/fixtures/detail_aspirin.html").unwrap();
        extract(&html).unwrap()
    }

    #[test]
    fn aspirin_identity() {
        let d = aspirin();
        assert_eq!(d.kind.as_deref(), Some("Small Molecule"));
        assert_eq!(d.groups.as_deref(), Some("Approved, Vet approved"));
        assert_eq!(d.iupac_name.as_deref(), Some("2-(acetyloxy)benzoic acid"));
        assert_eq!(d.smiles.as_deref(), Some("CC(=O)OC1=CC=CC=C1C(O)=O"));
        assert!(d.summary.as_deref().unwrap().starts_with("Aspirin is a salicylate"));
    }

    #[test]
    fn aspirin_text_sections() {
        let d = aspirin();
        assert_eq!(
            d.background.as_deref(),
            Some("Acetylsalicylic acid is a nonsteroidal anti-inflammatory drug.")
        );
        assert_eq!(
            d.indication.as_deref(),
            Some("Used to reduce fever and relieve mild to moderate pain.")
        );
        assert_eq!(d.pharmacodynamics, None);
    }

    #[test]
    fn aspirin_synonyms_in_order() {
        let d = aspirin();
        assert_eq!(
            d.synonyms,
            vec!["2-Acetoxybenzoic acid", "Acetylsalicylic acid", "ASA"]
        );
    }

    #[test]
    fn aspirin_moa_rows() {
        let d = aspirin();
        assert_eq!(d.moa.len(), 2);
        assert_eq!(
            d.moa[0],
            MoaEntry {
                target: "Prostaglandin G/H synthase 1".into(),
                actions: "Inhibitor".into(),
                organism: "Humans".into(),
            }
        );
        assert_eq!(d.moa[1].target, "Prostaglandin G/H synthase 2");
    }

    #[test]
    fn missing_terms_leave_defaults() {
        let d = extract(&page(r#"<dt id="type">Type</dt><dd>Biotech</dd>"#)).unwrap();
        assert_eq!(
            d,
            DetailData {
                kind: Some("Biotech".into()),
                ..DetailData::default()
            }
        );
    }

    #[test]
    fn indication_without_paragraph_is_none() {
        let d = extract(&page(
            r#"<dt id="indication">Indication</dt><dd>Plain text only</dd>"#,
        ))
        .unwrap();
        assert_eq!(d.indication, None);
    }

    #[test]
    fn indication_placeholder_is_none() {
        let d = extract(&page(
            r#"<dt id="indication">Indication</dt><dd><p> Not Available </p></dd>"#,
        ))
        .unwrap();
        assert_eq!(d.indication, None);
    }

    #[test]
    fn term_without_value_sibling() {
        let d = extract(&page(r#"<dt id="synonyms">Synonyms</dt>"#)).unwrap();
        assert!(d.synonyms.is_empty());
    }

    #[test]
    fn value_sibling_may_follow_other_elements() {
        let d = extract(&page(
            r#"<dt id="smiles">SMILES</dt><span>copy</span><dd> C </dd>"#,
        ))
        .unwrap();
        assert_eq!(d.smiles.as_deref(), Some("C"));
    }

    #[test]
    fn moa_without_table_is_empty() {
        let d = extract(&page(
            r#"<dt id="mechanism-of-action">Mechanism</dt><dd><p>Unknown.</p></dd>"#,
        ))
        .unwrap();
        assert!(d.moa.is_empty());
    }

    #[test]
    fn short_moa_row_is_error() {
        let html = page(
            r#"<dt id="mechanism-of-action">Mechanism</dt><dd>
            <table id="drug-moa-target-table">
              <tr><th>Target</th><th>Actions</th><th>Organism</th></tr>
              <tr><td>COX-1</td><td>Inhibitor</td></tr>
            </table></dd>"#,
        );
        let err = extract(&html).unwrap_err();
        assert!(matches!(err, ScrapeError::ShortMoaRow { row: 1, found: 2 }));
    }

    #[test]
    fn same_input_same_output() {
        let html = std::fs::read_to_string("tests/fixtures/detail_aspirin.html").unwrap();
        assert_eq!(extract(&html).unwrap(), extract(&html).unwrap());
    }
}
