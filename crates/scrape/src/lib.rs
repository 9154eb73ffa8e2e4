//! Business-directory lead scraping
//!
//! Fetches directory search pages through the BrightData web unlocker and
//! parses business cards out of the HTML. Without an API token the
//! scraper fabricates plausible dummy leads instead, so the rest of the
//! pipeline can be exercised without credentials.

mod dummy;
mod fetch;
mod parse;

pub use dummy::generate_dummy_leads;
pub use fetch::{BrightDataFetcher, FetchSettings};
pub use parse::parse_directory_page;

use serde::Serialize;
use thiserror::Error;

/// Scraper errors
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("fetch failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("scrape network error: {0}")]
    Network(String),

    #[error("scrape API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Network(err.to_string())
    }
}

/// A candidate lead pulled from a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedLead {
    pub name: String,
    pub phone: String,
    pub category: String,
    pub industry: String,
    pub address: String,
    pub website: String,
    pub city: String,
    pub state: String,
}

/// Directory scraper front door
pub struct LeadScraper {
    fetcher: Option<BrightDataFetcher>,
}

impl LeadScraper {
    /// An empty token disables real fetching; `scrape` then returns
    /// dummy leads.
    pub fn new(token: &str, zone: &str) -> Self {
        let fetcher = if token.is_empty() {
            None
        } else {
            Some(BrightDataFetcher::new(token, zone, FetchSettings::default()))
        };
        Self { fetcher }
    }

    pub fn is_dummy(&self) -> bool {
        self.fetcher.is_none()
    }

    /// Scrape up to `limit` candidate leads for an industry in a location
    /// (formatted `City, ST`). Never fails in dummy mode.
    pub async fn scrape(
        &self,
        location: &str,
        industry: &str,
        limit: usize,
    ) -> Result<Vec<ScrapedLead>, ScrapeError> {
        let Some(fetcher) = &self.fetcher else {
            tracing::info!(location, industry, "no scrape token, generating dummy leads");
            return Ok(generate_dummy_leads(location, industry, limit));
        };

        let (city, state) = split_location(location);
        let mut leads = Vec::new();
        let mut page = 1u32;

        // Directory pagination caps out well before this; the bound only
        // protects against a selector change making pages look empty-full.
        while leads.len() < limit && page <= 10 {
            let url = search_url(industry, location, page);
            let html = fetcher.fetch(&url).await?;
            let found = parse_directory_page(&html, industry, city, state);
            if found.is_empty() {
                break;
            }
            for lead in found {
                if leads.len() >= limit {
                    break;
                }
                leads.push(lead);
            }
            page += 1;
        }

        tracing::info!(location, industry, count = leads.len(), "scrape complete");
        Ok(leads)
    }
}

fn search_url(industry: &str, location: &str, page: u32) -> String {
    format!(
        "https://www.yellowpages.com/search?search_terms={}&geo_location_terms={}&page={page}",
        urlencode(industry),
        urlencode(location),
    )
}

fn split_location(location: &str) -> (&str, &str) {
    match location.split_once(',') {
        Some((city, state)) => (city.trim(), state.trim()),
        None => (location.trim(), ""),
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            ' ' => out.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    out
}
