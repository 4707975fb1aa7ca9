//! Flat listing scraper for cian.ru search results.
//!
//! [`SearchQuery`] describes the search and builds result page URLs.
//! [`Scraper`] walks the pages through an [`HttpClient`] and
//! [`parse_listings`] turns each page into [`Offer`]s.

mod parser;
mod query;

pub use parser::{Offer, parse_area, parse_floors, parse_listings, parse_price, parse_rooms};
pub use query::{City, Deal, Rooms, SearchQuery};

use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::fetch::{HttpClient, fetch_text};
use crate::sheet::{Cell, Table};

/// Pages requested when no limit is given.
pub const DEFAULT_PAGES: u32 = 75;

const MAX_CONSECUTIVE_FAILURES: u32 = 3;

pub const DEFAULT_MIN_AREA: u32 = 0;
pub const DEFAULT_MAX_AREA: u32 = 250;

/// Parses typed area bounds in m². If either one is not a whole number,
/// both fall back to the defaults.
pub fn parse_area_bounds(min: &str, max: &str) -> (u32, u32) {
    match (min.trim().parse::<u32>(), max.trim().parse::<u32>()) {
        (Ok(min), Ok(max)) => (min, max),
        _ => {
            warn!(min, max, "Invalid area, using {DEFAULT_MIN_AREA} to {DEFAULT_MAX_AREA} m²");
            (DEFAULT_MIN_AREA, DEFAULT_MAX_AREA)
        }
    }
}

pub struct Scraper<C> {
    client: C,
    page_delay: Duration,
}

impl<C: HttpClient> Scraper<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            page_delay: Duration::from_secs(2),
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Fetches result pages `1..=pages` and returns the offers in page order,
    /// deduplicated by URL.
    ///
    /// Stops early at the first page that yields no new offers. A page that
    /// fails is retried; after three failures in a row the scrape stops and
    /// returns what it has, or the error if nothing was collected.
    /// `on_page` is called with the page number and its new offer count.
    #[tracing::instrument(skip(self, query, on_page), fields(city = %query.city, deal = %query.deal))]
    pub async fn collect<F>(&self, query: &SearchQuery, pages: u32, mut on_page: F) -> Result<Vec<Offer>>
    where
        F: FnMut(u32, usize),
    {
        let mut seen = HashSet::new();
        let mut offers = Vec::new();
        let mut failures = 0;
        let mut page = 1;

        while page <= pages {
            let url = query.search_url(page)?;
            debug!(page, url = %url, "Fetching page");

            let html = match fetch_text(&self.client, url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    failures += 1;
                    warn!(page, attempt = failures, error = %e, "Page fetch failed");
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        if offers.is_empty() {
                            return Err(e.context(format!("page {page} failed {failures} times")));
                        }
                        warn!(page, collected = offers.len(), "Too many failures, stopping early");
                        break;
                    }
                    tokio::time::sleep(self.page_delay).await;
                    continue;
                }
            };
            failures = 0;

            let fresh: Vec<Offer> = parse_listings(&html)?
                .into_iter()
                .filter(|o| seen.insert(o.url.clone()))
                .collect();

            if fresh.is_empty() {
                info!(page, "No new offers, stopping");
                break;
            }

            debug!(page, offers = fresh.len(), "Page parsed");
            on_page(page, fresh.len());
            offers.extend(fresh);

            page += 1;
            if page <= pages {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(offers = offers.len(), "Scrape complete");
        Ok(offers)
    }
}

/// Output columns of a scrape, in order.
pub const OFFER_COLUMNS: [&str; 14] = [
    "url",
    "location",
    "deal_type",
    "type_property",
    "floor",
    "floors_count",
    "rooms_count",
    "total_meters",
    "price",
    "price_per_m2",
    "district",
    "street",
    "house_number",
    "underground",
];

/// Lays out offers as a table ready to be written to a spreadsheet.
pub fn offers_to_table(offers: &[Offer], deal: Deal) -> Table {
    fn int(v: Option<i64>) -> Cell {
        v.map(Cell::Int).unwrap_or(Cell::Empty)
    }
    fn text(v: &Option<String>) -> Cell {
        v.clone().map(Cell::Text).unwrap_or(Cell::Empty)
    }

    let mut table = Table::new(OFFER_COLUMNS.iter().map(|c| c.to_string()).collect());

    for offer in offers {
        let price_per_m2 = match (offer.price, offer.total_meters) {
            (Some(p), Some(m)) if m > 0.0 => Cell::Float((p as f64 / m).round()),
            _ => Cell::Empty,
        };
        table.push_row(vec![
            Cell::Text(offer.url.clone()),
            text(&offer.location),
            Cell::Text("sale".to_string()),
            Cell::Text(deal.to_string()),
            int(offer.floor),
            int(offer.floors_count),
            int(offer.rooms_count),
            offer.total_meters.map(Cell::Float).unwrap_or(Cell::Empty),
            int(offer.price),
            price_per_m2,
            text(&offer.district),
            text(&offer.street),
            text(&offer.house_number),
            text(&offer.underground),
        ]);
    }

    table
}

/// Parses a comma-separated room list such as `studio,1,2`.
pub fn parse_rooms_list(s: &str) -> Result<Vec<Rooms>> {
    let rooms = s
        .split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.parse::<Rooms>())
        .collect::<Result<Vec<_>>>()?;
    if rooms.is_empty() {
        return Err(anyhow!("at least one room type is required"));
    }
    Ok(rooms)
}
