//! Offer card extraction from cian.ru search result pages.

use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};

/// One flat offer as shown on a search results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Offer {
    pub url: String,
    pub location: Option<String>,
    pub floor: Option<i64>,
    pub floors_count: Option<i64>,
    /// `0` for studios.
    pub rooms_count: Option<i64>,
    pub total_meters: Option<f64>,
    pub price: Option<i64>,
    pub district: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub underground: Option<String>,
}

const STREET_PREFIXES: &[&str] = &[
    "ул.", "улица", "пр-т", "просп.", "пер.", "ш.", "наб.", "б-р", "бул.", "проезд", "пл.", "аллея",
];

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts every offer card from a results page. Cards without a flat link
/// are skipped.
pub fn parse_listings(html: &str) -> Result<Vec<Offer>> {
    let document = Html::parse_document(html);
    let card_sel = selector(r#"article[data-name="CardComponent"]"#)?;
    let link_sel = selector(r#"a[href*="/flat/"]"#)?;
    let price_sel = selector(r#"[data-mark="MainPrice"]"#)?;
    let title_sel = selector(r#"[data-mark="OfferTitle"], [data-mark="OfferSubtitle"]"#)?;
    let geo_sel = selector(r#"a[data-name="GeoLabel"]"#)?;

    let mut offers = Vec::new();

    for card in document.select(&card_sel) {
        let Some(href) = card.select(&link_sel).find_map(|a| a.value().attr("href")) else {
            continue;
        };

        let title = card.select(&title_sel).map(text_of).collect::<Vec<_>>().join(" ");
        let (floor, floors_count) = parse_floors(&title);

        let mut offer = Offer {
            url: href.split('?').next().unwrap_or(href).to_string(),
            price: card.select(&price_sel).next().and_then(|p| parse_price(&text_of(p))),
            rooms_count: parse_rooms(&title),
            total_meters: parse_area(&title),
            floor,
            floors_count,
            ..Default::default()
        };

        let labels: Vec<String> = card.select(&geo_sel).map(text_of).collect();
        apply_geo_labels(&mut offer, &labels);

        offers.push(offer);
    }

    Ok(offers)
}

fn apply_geo_labels(offer: &mut Offer, labels: &[String]) {
    offer.location = labels.first().cloned();

    for (i, label) in labels.iter().enumerate().skip(1) {
        if let Some(district) = label.strip_prefix("р-н ") {
            offer.district = Some(district.trim().to_string());
        } else if let Some(metro) = label.strip_prefix("м. ") {
            offer.underground = Some(metro.trim().to_string());
        } else if STREET_PREFIXES.iter().any(|p| label.contains(p)) {
            offer.street = Some(label.clone());
        } else if i == labels.len() - 1 && label.starts_with(|c: char| c.is_ascii_digit()) {
            offer.house_number = Some(label.clone());
        }
    }
}

/// Digits of a price such as `12 500 000 ₽`.
pub fn parse_price(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Room count from a title such as `2-комн. квартира`; studios are `0`.
pub fn parse_rooms(text: &str) -> Option<i64> {
    if text.to_lowercase().contains("студия") {
        return Some(0);
    }
    let end = text.find("-комн")?;
    trailing_number(&text[..end]).and_then(|n| n.parse().ok())
}

/// Total area from a title such as `54,3 м²`.
pub fn parse_area(text: &str) -> Option<f64> {
    let end = text.find("м²")?;
    trailing_number(text[..end].trim_end()).and_then(|n| n.replace(',', ".").parse().ok())
}

/// Floor and floor count from a title such as `5/12 этаж`.
pub fn parse_floors(text: &str) -> (Option<i64>, Option<i64>) {
    let Some(end) = text.find("этаж") else {
        return (None, None);
    };
    let token = text[..end].split_whitespace().last().unwrap_or_default();
    let mut parts = token.split('/');
    let floor = parts.next().and_then(|p| p.parse().ok());
    let floors_count = parts.next().and_then(|p| p.parse().ok());
    (floor, floors_count)
}

/// The run of digits, `,` and `.` at the end of `text`.
fn trailing_number(text: &str) -> Option<&str> {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == ',' || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    let number = text[start..].trim_matches(|c| c == ',' || c == '.');
    (!number.is_empty()).then_some(number)
}
