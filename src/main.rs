mod error;
mod output;
mod parser;
mod pipeline;
mod records;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use output::HtmlArchive;
use pipeline::{Event, HttpSource, Pipeline};
use records::DrugRecord;
use settings::Settings;

#[derive(Parser)]
#[command(name = "drugbank_scraper", about = "Scrape DrugBank drug listings and detail pages into JSON")]
struct Cli {
    /// Number of listing pages to scrape
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    num_pages: u32,
    /// 0: page status, 1: molecule names, 2: full JSON per record
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    verbosity: u8,
    /// Save the raw HTML of every fetched page
    #[arg(short, long)]
    save_html: bool,
    /// Output file (default: settings `output_path`)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Console echo for pipeline events, printed above the page progress bar.
struct Reporter {
    verbosity: u8,
    pb: ProgressBar,
}

impl Reporter {
    fn new(verbosity: u8, pages: u32) -> anyhow::Result<Self> {
        let pb = ProgressBar::new(pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages")?
                .progress_chars("=> "),
        );
        Ok(Reporter { verbosity, pb })
    }

    fn on_event(&self, event: Event<'_>) {
        match event {
            Event::Record(record) => self.record(record),
            Event::PageDone { page, records } => {
                info!(page, records, "page complete");
                self.pb.println(format!("Page {} scraped.", page));
                self.pb.inc(1);
            }
        }
    }

    fn record(&self, record: &DrugRecord) {
        match self.verbosity {
            1 => {
                self.pb.println(&record.molecule);
                self.pb.println("-----------\n");
            }
            2 => match serde_json::to_string_pretty(record) {
                Ok(json) => self.pb.println(json),
                Err(e) => tracing::warn!("Cannot render {}: {}", record.molecule, e),
            },
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "Starting scrape");

    let output_path = cli.output.clone().unwrap_or_else(|| settings.output_path.clone());
    let archive = cli.save_html.then(|| HtmlArchive::new(&settings.html_dir));
    let source = HttpSource::new(&settings.user_agent).context("Failed to build HTTP client")?;
    let pipeline = Pipeline::new(Arc::new(source), settings, archive)?;

    println!("Starting scrape...");
    let reporter = Reporter::new(cli.verbosity, cli.num_pages)?;
    let result = pipeline.run(cli.num_pages, |event| reporter.on_event(event)).await;
    reporter.pb.finish_and_clear();

    let records = match result {
        Ok(records) => records,
        Err(aborted) => {
            let partial = output::partial_path(&output_path);
            output::write_records(&partial, &aborted.records)?;
            eprintln!(
                "Scrape failed; {} completed records flushed to {}",
                aborted.records.len(),
                partial.display()
            );
            return Err(aborted.into());
        }
    };

    println!("Scraping completed.");
    output::write_records(&output_path, &records)?;
    if cli.verbosity > 0 {
        println!("Scraped data has been saved to {}", output_path.display());
        println!("{} records in {:.1}s", records.len(), t0.elapsed().as_secs_f64());
    }
    Ok(())
}
