use crate::records::{DetailData, DrugRecord, ListingRow};

/// Combine a listing row with its detail page.
///
/// Without a link the record carries listing fields only. With a link the
/// description comes from the detail background and every detail field is
/// copied over; a missing `detail` then counts as an empty page.
pub fn merge(row: ListingRow, detail: Option<DetailData>) -> DrugRecord {
    let ListingRow {
        molecule,
        link,
        weight,
        formula,
        description,
        categories,
        ..
    } = row;

    let Some(link) = link else {
        return DrugRecord {
            smiles: None,
            molecule,
            iupac_name: None,
            summary: None,
            weight,
            formula,
            description,
            categories,
            link: None,
            kind: None,
            groups: None,
            synonyms: Vec::new(),
            indication: None,
            pharmacodynamics: None,
            moa: Vec::new(),
        };
    };

    let detail = detail.unwrap_or_default();
    DrugRecord {
        smiles: detail.smiles,
        molecule,
        iupac_name: detail.iupac_name,
        summary: detail.summary,
        weight,
        formula,
        description: detail.background,
        categories,
        link: Some(link.into()),
        kind: detail.kind,
        groups: detail.groups,
        synonyms: detail.synonyms,
        indication: detail.indication,
        pharmacodynamics: detail.pharmacodynamics,
        moa: detail.moa,
    }
}

// ── Tests ──
