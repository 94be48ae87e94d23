use std::path::PathBuf;

use thiserror::Error;

use crate::records::DrugRecord;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("listing page {page} has no `{table_id}` table")]
    MissingTable { page: u32, table_id: &'static str },

    #[error("listing page {page}, row {row}: expected at least 5 cells, found {found}")]
    ShortListingRow { page: u32, row: usize, found: usize },

    #[error("mechanism-of-action row {row}: expected 3 cells, found {found}")]
    ShortMoaRow { row: usize, found: usize },

    #[error("cannot resolve link `{href}`")]
    InvalidLink {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("detail task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// A fatal error together with every record completed before it.
#[derive(Debug, Error)]
#[error("scrape aborted after {} records", .records.len())]
pub struct Aborted {
    pub records: Vec<DrugRecord>,
    #[source]
    pub error: ScrapeError,
}

impl Aborted {
    pub fn new(records: Vec<DrugRecord>, error: ScrapeError) -> Self {
        Aborted { records, error }
    }
}
