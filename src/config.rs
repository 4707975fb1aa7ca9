//! Project directory layout.
//!
//! All commands work relative to one project root:
//!
//! ```text
//! <root>/
//!   atest/        reference spreadsheets
//!   raw/          scraper output
//!   raw/final/    merged spreadsheet
//!   figures/      report charts and readME.txt
//!   filters.txt   report filters
//! ```

use std::path::{Path, PathBuf};

/// Environment variable naming the project root.
pub const ROOT_ENV: &str = "LISTINGS_ROOT";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the root from an explicit flag, then `LISTINGS_ROOT`, then
    /// the current directory.
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let root = flag
            .or_else(|| std::env::var(ROOT_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn atest_dir(&self) -> PathBuf {
        self.root.join("atest")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn final_dir(&self) -> PathBuf {
        self.raw_dir().join("final")
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.root.join("figures")
    }

    pub fn filters_file(&self) -> PathBuf {
        self.root.join("filters.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_relative_to_root() {
        let ws = Workspace::new("/data/flats");
        assert_eq!(ws.atest_dir(), PathBuf::from("/data/flats/atest"));
        assert_eq!(ws.final_dir(), PathBuf::from("/data/flats/raw/final"));
        assert_eq!(ws.filters_file(), PathBuf::from("/data/flats/filters.txt"));
    }

    #[test]
    fn test_flag_wins_over_environment() {
        let ws = Workspace::resolve(Some(PathBuf::from("/from/flag")));
        assert_eq!(ws.root(), Path::new("/from/flag"));
    }
}
