//! Search parameters for the cian.ru flat search.

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;

const SEARCH_URL: &str = "https://www.cian.ru/cat.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum City {
    Moscow,
    SaintPetersburg,
    NizhnyNovgorod,
}

impl City {
    pub const ALL: [City; 3] = [City::Moscow, City::SaintPetersburg, City::NizhnyNovgorod];

    /// Short name used in output file names.
    pub fn abbr(self) -> &'static str {
        match self {
            City::Moscow => "Msk",
            City::SaintPetersburg => "SPb",
            City::NizhnyNovgorod => "NNov",
        }
    }

    fn region_id(self) -> u32 {
        match self {
            City::Moscow => 1,
            City::SaintPetersburg => 2,
            City::NizhnyNovgorod => 4885,
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            City::Moscow => "Moscow",
            City::SaintPetersburg => "Saint Petersburg",
            City::NizhnyNovgorod => "Nizhny Novgorod",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Deal {
    NewBuild,
    Secondary,
}

impl Deal {
    pub const ALL: [Deal; 2] = [Deal::NewBuild, Deal::Secondary];

    /// Short name used in output file names.
    pub fn abbr(self) -> &'static str {
        match self {
            Deal::NewBuild => "first",
            Deal::Secondary => "second",
        }
    }

    fn object_type(self) -> &'static str {
        match self {
            Deal::NewBuild => "2",
            Deal::Secondary => "1",
        }
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Deal::NewBuild => "New build",
            Deal::Secondary => "Secondary",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rooms {
    Studio,
    Count(u8),
}

impl Rooms {
    pub const ALL: [Rooms; 6] = [
        Rooms::Studio,
        Rooms::Count(1),
        Rooms::Count(2),
        Rooms::Count(3),
        Rooms::Count(4),
        Rooms::Count(5),
    ];

    fn param(self) -> String {
        match self {
            Rooms::Studio => "room9".to_string(),
            Rooms::Count(n) => format!("room{n}"),
        }
    }
}

impl fmt::Display for Rooms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rooms::Studio => f.write_str("Studio"),
            Rooms::Count(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Rooms {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("studio") {
            return Ok(Rooms::Studio);
        }
        match s.parse::<u8>() {
            Ok(n @ 1..=5) => Ok(Rooms::Count(n)),
            _ => bail!("rooms must be 'studio' or 1-5, got '{s}'"),
        }
    }
}

/// One flat search: city, market, room counts and total area bounds (m²).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub city: City,
    pub deal: Deal,
    pub rooms: Vec<Rooms>,
    pub min_area: u32,
    pub max_area: u32,
}

impl SearchQuery {
    /// `{city}_{deal}_{rooms}_({min}_{max})`.
    ///
    /// Rooms render as `studio` when the first selection is a studio,
    /// otherwise as counts joined by `_`; no selection renders as `any`.
    pub fn base_filename(&self) -> String {
        let rooms = match self.rooms.first() {
            None => "any".to_string(),
            Some(Rooms::Studio) => "studio".to_string(),
            Some(_) => self
                .rooms
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("_"),
        };
        format!(
            "{}_{}_{}_({}_{})",
            self.city.abbr(),
            self.deal.abbr(),
            rooms,
            self.min_area,
            self.max_area
        )
    }

    /// Output file name with a timestamp suffix.
    pub fn filename_at(&self, at: DateTime<Local>) -> String {
        format!("{}_{}.xlsx", self.base_filename(), at.format("%Y%m%d_%H%M%S"))
    }

    /// Search results URL for a 1-based page.
    pub fn search_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(SEARCH_URL)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("deal_type", "sale");
            q.append_pair("engine_version", "2");
            q.append_pair("offer_type", "flat");
            q.append_pair("region", &self.city.region_id().to_string());
            q.append_pair("object_type[0]", self.deal.object_type());
            for rooms in &self.rooms {
                q.append_pair(&rooms.param(), "1");
            }
            q.append_pair("minarea", &self.min_area.to_string());
            q.append_pair("maxarea", &self.max_area.to_string());
            q.append_pair("p", &page.to_string());
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(rooms: Vec<Rooms>) -> SearchQuery {
        SearchQuery {
            city: City::SaintPetersburg,
            deal: Deal::NewBuild,
            rooms,
            min_area: 30,
            max_area: 80,
        }
    }

    #[test]
    fn test_base_filename_joins_room_counts() {
        let q = query(vec![Rooms::Count(1), Rooms::Count(2)]);
        assert_eq!(q.base_filename(), "SPb_first_1_2_(30_80)");
    }

    #[test]
    fn test_base_filename_studio_first_wins() {
        let q = query(vec![Rooms::Studio, Rooms::Count(3)]);
        assert_eq!(q.base_filename(), "SPb_first_studio_(30_80)");
    }

    #[test]
    fn test_base_filename_secondary_moscow() {
        let mut q = query(vec![Rooms::Count(3)]);
        q.city = City::Moscow;
        q.deal = Deal::Secondary;
        assert_eq!(q.base_filename(), "Msk_second_3_(30_80)");
    }

    #[test]
    fn test_filename_at_appends_timestamp() {
        let q = query(vec![Rooms::Count(1)]);
        let at = Local.with_ymd_and_hms(2024, 5, 17, 9, 3, 7).unwrap();
        assert_eq!(q.filename_at(at), "SPb_first_1_(30_80)_20240517_090307.xlsx");
    }

    #[test]
    fn test_search_url_carries_parameters() {
        let q = query(vec![Rooms::Studio, Rooms::Count(2)]);
        let url = q.search_url(3).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let has = |k: &str, v: &str| pairs.iter().any(|(pk, pv)| pk == k && pv == v);

        assert_eq!(url.host_str(), Some("www.cian.ru"));
        assert!(has("region", "2"));
        assert!(has("object_type[0]", "2"));
        assert!(has("room9", "1"));
        assert!(has("room2", "1"));
        assert!(has("minarea", "30"));
        assert!(has("maxarea", "80"));
        assert!(has("p", "3"));
    }

    #[test]
    fn test_search_url_region_per_city() {
        for (city, region) in [
            (City::Moscow, "1"),
            (City::SaintPetersburg, "2"),
            (City::NizhnyNovgorod, "4885"),
        ] {
            let mut q = query(vec![Rooms::Count(1)]);
            q.city = city;
            let url = q.search_url(1).unwrap();
            let found = url
                .query_pairs()
                .find(|(k, _)| k == "region")
                .map(|(_, v)| v.into_owned());
            assert_eq!(found.as_deref(), Some(region), "{city}");
        }
    }

    #[test]
    fn test_rooms_from_str() {
        assert_eq!("studio".parse::<Rooms>().unwrap(), Rooms::Studio);
        assert_eq!(" 4 ".parse::<Rooms>().unwrap(), Rooms::Count(4));
        assert!("6".parse::<Rooms>().is_err());
        assert!("0".parse::<Rooms>().is_err());
    }
}
