use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ScrapeError;
use crate::records::DrugRecord;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ScrapeError + '_ {
    move |source| ScrapeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write all records as one pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[DrugRecord]) -> Result<(), ScrapeError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_error(path))?;
    }
    let file = fs::File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(std::io::Error::from)
        .map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))?;
    info!(path = %path.display(), records = records.len(), "wrote records");
    Ok(())
}

/// `out/drugbank_data.json` → `out/drugbank_data.partial.json`
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "drugbank_data".to_string());
    path.with_file_name(format!("{}.partial.json", stem))
}

/// Raw HTML side channel: every fetched page is written under `dir`.
#[derive(Debug, Clone)]
pub struct HtmlArchive {
    dir: PathBuf,
}

impl HtmlArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        HtmlArchive { dir: dir.into() }
    }

    pub fn listing_path(&self, page: u32) -> PathBuf {
        self.dir.join(format!("page_{}.html", page))
    }

    pub fn detail_path(&self, page: u32, slug: &str) -> PathBuf {
        self.dir.join(format!("page_{}_{}.html", page, slug))
    }

    pub async fn save_listing(&self, page: u32, html: &str) -> Result<(), ScrapeError> {
        self.save(&self.listing_path(page), html).await
    }

    pub async fn save_detail(&self, page: u32, slug: &str, html: &str) -> Result<(), ScrapeError> {
        self.save(&self.detail_path(page, slug), html).await
    }

    async fn save(&self, path: &Path, html: &str) -> Result<(), ScrapeError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))?;
        tokio::fs::write(path, html).await.map_err(io_error(path))?;
        info!(path = %path.display(), "saved raw html");
        Ok(())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(molecule: &str) -> DrugRecord {
        DrugRecord {
            smiles: None,
            molecule: molecule.into(),
            iupac_name: None,
            summary: None,
            weight: "1.0".into(),
            formula: "H".into(),
            description: Some("Ünïcode stays".into()),
            categories: None,
            link: None,
            kind: None,
            groups: None,
            synonyms: Vec::new(),
            indication: None,
            pharmacodynamics: None,
            moa: Vec::new(),
        }
    }

    #[test]
    fn writes_pretty_array_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_records(&path, &[record("A"), record("B")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert!(text.contains("Ünïcode stays"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["molecule"], "A");
        assert_eq!(value[1]["molecule"], "B");
    }

    #[test]
    fn partial_path_keeps_directory() {
        assert_eq!(
            partial_path(Path::new("out/drugbank_data.json")),
            PathBuf::from("out/drugbank_data.partial.json")
        );
    }

    #[test]
    fn archive_file_names() {
        let archive = HtmlArchive::new("html_pages");
        assert_eq!(archive.listing_path(2), PathBuf::from("html_pages/page_2.html"));
        assert_eq!(
            archive.detail_path(2, "DB00945"),
            PathBuf::from("html_pages/page_2_DB00945.html")
        );
    }

    #[tokio::test]
    async fn archive_writes_raw_html() {
        let dir = tempfile::tempdir().unwrap();
        let archive = HtmlArchive::new(dir.path().join("html"));
        archive.save_detail(1, "DB00945", "<html></html>").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(archive.detail_path(1, "DB00945")).unwrap(),
            "<html></html>"
        );
    }
}
