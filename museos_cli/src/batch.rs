use crate::ai::Extractor;
use crate::error::CsvError;
use crate::scraper::{truncate_chars, PageSource};
use crate::utils;
use crate::{MuseumListing, MuseumRecord};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Fixed-interval scheduler: consecutive `tick`s start at least `interval` apart.
/// The first tick never waits.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub async fn tick(&mut self) {
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub rows: usize,
    pub skipped: usize,
    pub extraction_failures: usize,
}

pub struct Batch<'a> {
    pages: &'a dyn PageSource,
    extractor: &'a dyn Extractor,
    pacer: Pacer,
    max_text_chars: usize,
}

impl<'a> Batch<'a> {
    pub fn new(
        pages: &'a dyn PageSource,
        extractor: &'a dyn Extractor,
        request_delay: Duration,
        max_text_chars: usize,
    ) -> Self {
        Self {
            pages,
            extractor,
            pacer: Pacer::new(request_delay),
            max_text_chars,
        }
    }

    /// Fetches and extracts every listing in order.
    ///
    /// A listing whose page cannot be fetched produces no record. A failed
    /// extraction still produces a record carrying only the name and URL.
    pub async fn collect(&mut self, listings: &[MuseumListing]) -> (Vec<MuseumRecord>, BatchReport) {
        let total = listings.len();
        let mut records = Vec::new();
        let mut report = BatchReport::default();

        println!("Iniciando procesamiento con IA para {} museos...", total);

        for (i, listing) in listings.iter().enumerate() {
            self.pacer.tick().await;
            println!("[{}/{}] Procesando: {}...", i + 1, total, listing.name);

            let text = match self.pages.page_text(&listing.url).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(name = %listing.name, url = %listing.url, error = %e, "detail page skipped");
                    println!("   ❌ {}", e);
                    report.skipped += 1;
                    continue;
                }
            };

            let prompt_text = truncate_chars(&text, self.max_text_chars);
            let record = match self.extractor.extract(prompt_text).await {
                Ok(fields) => {
                    println!("   ✅ OK");
                    MuseumRecord::new(listing, fields)
                }
                Err(e) => {
                    warn!(name = %listing.name, url = %listing.url, error = %e, "extraction failed, keeping base fields");
                    println!("   ⚠️ Sin datos de IA: {}", e);
                    report.extraction_failures += 1;
                    MuseumRecord::base(listing)
                }
            };
            records.push(record);
        }

        report.rows = records.len();
        (records, report)
    }

    /// Runs the whole batch and writes `output` when at least one row was produced.
    /// Returns the number of rows written.
    pub async fn run(&mut self, listings: &[MuseumListing], output: &Path) -> Result<usize, CsvError> {
        let (records, report) = self.collect(listings).await;
        info!(
            rows = report.rows,
            skipped = report.skipped,
            extraction_failures = report.extraction_failures,
            "batch finished"
        );

        if records.is_empty() {
            println!("\n❌ No se obtuvo ningún museo; no se escribe {}", output.display());
            return Ok(0);
        }

        utils::save_records(&records, output)?;
        println!(
            "\n¡Éxito! Se guardaron {} museos en '{}' ({} omitidos, {} sin datos de IA)",
            report.rows,
            output.display(),
            report.skipped,
            report.extraction_failures
        );
        Ok(records.len())
    }
}
