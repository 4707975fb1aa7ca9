//! Row filters read from `filters.txt`.
//!
//! ```text
//! # Task 5.
//! 1 комн. кв-ра в развитом е!1-комн. квартира
//! Приморский
//! ```
//!
//! A line starting with `#` opens a section; the section name is informative
//! only. Every other non-empty line in a section is a filter value. Values
//! mentioning rooms (`комн`) drop flats whose room label contains the part of
//! the value before `!`; any other value drops flats in the district of that
//! exact name.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use super::types::Flat;

const ROOMS_MARKER: &str = "комн";

#[derive(Debug, Default, PartialEq)]
pub struct Filters {
    pub sections: Vec<(String, Vec<String>)>,
}

impl Filters {
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<(String, Vec<String>)> = Vec::new();

        for line in text.lines().map(str::trim) {
            if let Some(name) = line.strip_prefix('#') {
                let name = name.trim().trim_matches('.').trim();
                sections.push((name.to_string(), Vec::new()));
            } else if !line.is_empty() {
                if let Some((_, values)) = sections.last_mut() {
                    values.push(line.to_string());
                }
            }
        }

        Self { sections }
    }

    /// Reads filters from `path`; a missing file means no filters.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "No filters file");
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(Self::parse(&text)))
    }

    pub fn apply(&self, mut flats: Vec<Flat>) -> Vec<Flat> {
        let before = flats.len();

        for value in self.sections.iter().flat_map(|(_, values)| values) {
            if value.contains(ROOMS_MARKER) {
                let needle = value.split('!').next().unwrap_or_default().trim();
                flats.retain(|f| !rooms_label(f).contains(needle));
            } else if flats.iter().any(|f| f.district.as_deref() == Some(value.as_str())) {
                flats.retain(|f| f.district.as_deref() != Some(value.as_str()));
            }
        }

        info!(before, after = flats.len(), "Filters applied");
        flats
    }
}

fn rooms_label(flat: &Flat) -> String {
    match flat.rooms_count {
        Some(n) => format!("{n} комн. кв-ра"),
        None => "nan комн. кв-ра".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(district: &str, rooms: i64) -> Flat {
        Flat {
            district: Some(district.to_string()),
            rooms_count: Some(rooms),
            ..Flat::new(1_000_000.0, 10.0)
        }
    }

    #[test]
    fn test_parse_sections() {
        let filters = Filters::parse("stray\n# Task 5.\nПриморский\n\n#Task 6\n2 комн. кв-ра!x\n");

        assert_eq!(
            filters.sections,
            vec![
                ("Task 5".to_string(), vec!["Приморский".to_string()]),
                ("Task 6".to_string(), vec!["2 комн. кв-ра!x".to_string()]),
            ]
        );
    }

    #[test]
    fn test_apply_removes_district() {
        let filters = Filters::parse("# a\nПриморский\n");
        let flats = vec![flat("Приморский", 1), flat("Невский", 1)];

        let kept = filters.apply(flats);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].district.as_deref(), Some("Невский"));
    }

    #[test]
    fn test_apply_removes_room_label_matches() {
        let filters = Filters::parse("# a\n2 комн. кв-ра в развитом е!2-комн. квартира\n2 комн. кв-ра\n");
        let flats = vec![flat("A", 2), flat("B", 3)];

        let kept = filters.apply(flats);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rooms_count, Some(3));
    }

    #[test]
    fn test_apply_ignores_unknown_district() {
        let filters = Filters::parse("# a\nНигде\n");
        let kept = filters.apply(vec![flat("A", 1)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let path = std::env::temp_dir().join("listing_tools_no_filters.txt");
        let _ = std::fs::remove_file(&path);
        assert_eq!(Filters::load(&path).unwrap(), None);
    }
}
