use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{debug, info};
use url::Url;

use crate::error::{Aborted, ScrapeError};
use crate::output::HtmlArchive;
use crate::parser::{detail, listing, merge::merge};
use crate::records::{DetailData, DrugRecord, ListingRow};
use crate::settings::Settings;

/// Where page HTML comes from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, ScrapeError>;
}

/// Plain GET over reqwest. Non-2xx answers are errors.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(HttpSource { client })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &Url) -> Result<String, ScrapeError> {
        let request_error = |source: reqwest::Error| ScrapeError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(request_error)
    }
}

/// Progress notifications emitted while scraping.
#[derive(Debug)]
pub enum Event<'a> {
    Record(&'a DrugRecord),
    PageDone { page: u32, records: usize },
}

/// Fetch → parse → merge over the listing pages.
pub struct Pipeline {
    source: Arc<dyn PageSource>,
    settings: Settings,
    origin: Url,
    archive: Option<HtmlArchive>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        settings: Settings,
        archive: Option<HtmlArchive>,
    ) -> Result<Self, ScrapeError> {
        let origin = settings
            .origin()
            .map_err(|source| ScrapeError::InvalidLink {
                href: settings.site_origin.clone(),
                source,
            })?;
        Ok(Pipeline {
            source,
            settings,
            origin,
            archive,
        })
    }

    /// Scrape pages `1..=pages` in order. On failure the records finished
    /// before the failing row are handed back inside [`Aborted`].
    pub async fn run<F>(&self, pages: u32, mut on_event: F) -> Result<Vec<DrugRecord>, Aborted>
    where
        F: FnMut(Event<'_>),
    {
        let mut records = Vec::new();
        for page in 1..=pages {
            let before = records.len();
            if let Err(error) = self.scrape_page(page, &mut records, &mut on_event).await {
                return Err(Aborted::new(records, error));
            }
            on_event(Event::PageDone {
                page,
                records: records.len() - before,
            });
        }
        Ok(records)
    }

    async fn scrape_page<F>(
        &self,
        page: u32,
        records: &mut Vec<DrugRecord>,
        on_event: &mut F,
    ) -> Result<(), ScrapeError>
    where
        F: FnMut(Event<'_>),
    {
        let url = self
            .settings
            .listing_url(page)
            .map_err(|source| ScrapeError::InvalidLink {
                href: self.settings.listing_url.clone(),
                source,
            })?;
        info!(page, %url, "fetching listing page");
        let html = self.source.fetch(&url).await?;
        if let Some(archive) = &self.archive {
            archive.save_listing(page, &html).await?;
        }

        let rows = listing::extract_rows(&html, page, &self.origin)?;
        let (details, failure) = self.fetch_details(&rows).await;

        for (row, detail) in rows.into_iter().zip(details) {
            // A linked row without detail data is the failed row or one after it
            if row.link.is_some() && detail.is_none() {
                break;
            }
            let record = merge(row, detail);
            on_event(Event::Record(&record));
            records.push(record);
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Detail data for each row, by row index. Requests start in row order with
    /// at most `detail_concurrency` in flight. A failure at row k stops new
    /// requests and cancels rows after k; rows before k still run to completion.
    /// The reported error is the one from the lowest failing row.
    async fn fetch_details(
        &self,
        rows: &[ListingRow],
    ) -> (Vec<Option<DetailData>>, Option<ScrapeError>) {
        let limit = self.settings.detail_concurrency.max(1);
        let mut details: Vec<Option<DetailData>> = vec![None; rows.len()];
        let mut failure = None;
        let mut tasks = JoinSet::new();
        let mut handles: Vec<(usize, AbortHandle)> = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let Some(link) = row.link.clone() else {
                continue;
            };
            while tasks.len() >= limit {
                let Some(joined) = tasks.join_next().await else {
                    break;
                };
                collect(joined, &mut details, &mut failure, &handles);
            }
            if failure.is_some() {
                break;
            }

            let source = Arc::clone(&self.source);
            let archive = self.archive.clone();
            let slug = row.slug.clone();
            let page = row.page;
            let handle = tasks.spawn(async move {
                let result =
                    fetch_detail(&*source, &link, page, slug.as_deref(), archive.as_ref()).await;
                (idx, result)
            });
            handles.push((idx, handle));
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut details, &mut failure, &handles);
        }

        (details, failure.map(|(_, error)| error))
    }
}

type DetailOutcome = (usize, Result<DetailData, ScrapeError>);

fn collect(
    joined: Result<DetailOutcome, JoinError>,
    details: &mut [Option<DetailData>],
    failure: &mut Option<(usize, ScrapeError)>,
    handles: &[(usize, AbortHandle)],
) {
    let (idx, error) = match joined {
        Ok((idx, Ok(detail))) => {
            details[idx] = Some(detail);
            return;
        }
        Ok((idx, Err(error))) => (idx, error),
        Err(e) if e.is_cancelled() => return,
        // Panicked task: its row is unknown, so nothing outstanding is kept
        Err(e) => (0, ScrapeError::Task(e)),
    };

    if failure.as_ref().is_some_and(|(first, _)| *first <= idx) {
        return;
    }
    for (_, handle) in handles.iter().filter(|(row, _)| *row > idx) {
        handle.abort();
    }
    *failure = Some((idx, error));
}

async fn fetch_detail(
    source: &dyn PageSource,
    link: &Url,
    page: u32,
    slug: Option<&str>,
    archive: Option<&HtmlArchive>,
) -> Result<DetailData, ScrapeError> {
    debug!(page, %link, "fetching detail page");
    let html = source.fetch(link).await?;
    if let (Some(archive), Some(slug)) = (archive, slug) {
        archive.save_detail(page, slug, &html).await?;
    }
    detail::extract(&html)
}

// ── Tests ──
