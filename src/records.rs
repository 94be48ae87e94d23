use serde::Serialize;
use url::Url;

/// One finished drug entry. Field order is the JSON key order of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugRecord {
    pub smiles: Option<String>,
    pub molecule: String,
    pub iupac_name: Option<String>,
    pub summary: Option<String>,
    pub weight: String,
    pub formula: String,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub groups: Option<String>,
    pub synonyms: Vec<String>,
    pub indication: Option<String>,
    pub pharmacodynamics: Option<String>,
    pub moa: Vec<MoaEntry>,
}

/// One row of the mechanism-of-action target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoaEntry {
    pub target: String,
    pub actions: String,
    pub organism: String,
}

/// Partial record read from a single listing table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub page: u32,
    pub molecule: String,
    pub link: Option<Url>,
    /// Final path segment of the detail href, used to name archived pages.
    pub slug: Option<String>,
    pub weight: String,
    pub formula: String,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
}

/// Fields only a detail page can provide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailData {
    pub kind: Option<String>,
    pub background: Option<String>,
    pub summary: Option<String>,
    pub indication: Option<String>,
    pub pharmacodynamics: Option<String>,
    pub iupac_name: Option<String>,
    pub smiles: Option<String>,
    pub groups: Option<String>,
    pub synonyms: Vec<String>,
    pub moa: Vec<MoaEntry>,
}
