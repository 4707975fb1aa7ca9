pub mod compare;
pub mod config;
pub mod fetch;
pub mod files;
pub mod listing;
pub mod merge;
pub mod output;
pub mod report;
pub mod scrape;
pub mod select;
pub mod sheet;
