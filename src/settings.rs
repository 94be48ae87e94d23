use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

const LISTING_URL: &str = "https://go.drugbank.com/drugs?approved=0&nutraceutical=0&illicit=0&investigational=0&withdrawn=0&experimental=0&us=0&ca=0&eu=0&commit=Apply+Filter&page={page}";
const SITE_ORIGIN: &str = "https://go.drugbank.com";

/// Runtime settings: built-in defaults, then `drugbank.toml` if present,
/// then `DRUGBANK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Listing endpoint; `{page}` is replaced by the page number.
    pub listing_url: String,
    /// Origin detail hrefs are resolved against.
    pub site_origin: String,
    pub output_path: PathBuf,
    pub html_dir: PathBuf,
    /// Detail pages fetched at once. 1 keeps a single request in flight.
    pub detail_concurrency: usize,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Settings::default())?;
        Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("drugbank").required(false))
            .add_source(Environment::with_prefix("DRUGBANK"))
            .build()?
            .try_deserialize()
            .context("Invalid drugbank settings")
    }

    pub fn listing_url(&self, page: u32) -> Result<Url, url::ParseError> {
        Url::parse(&self.listing_url.replace("{page}", &page.to_string()))
    }

    pub fn origin(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.site_origin)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listing_url: LISTING_URL.to_string(),
            site_origin: SITE_ORIGIN.to_string(),
            output_path: PathBuf::from("drugbank_data.json"),
            html_dir: PathBuf::from("html_pages"),
            detail_concurrency: 1,
            user_agent: concat!("drugbank_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_is_substituted() {
        let s = Settings::default();
        let url = s.listing_url(7).unwrap();
        assert_eq!(url.host_str(), Some("go.drugbank.com"));
        assert!(url.as_str().ends_with("&page=7"));
    }

    #[test]
    fn load_without_overrides_matches_default() {
        assert_eq!(Settings::load().unwrap(), Settings::default());
    }

    #[test]
    fn detail_hrefs_join_the_origin() {
        let origin = Settings::default().origin().unwrap();
        assert_eq!(
            origin.join("/drugs/DB00945").unwrap().as_str(),
            "https://go.drugbank.com/drugs/DB00945"
        );
    }
}
