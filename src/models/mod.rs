use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One listing scraped from a site's results page.
///
/// Field order matches the export columns and the `listings` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRecord {
    /// Configured site name
    pub source: String,
    /// Absolute link to the listing, or empty
    pub url: String,
    pub title: String,
    pub price: String,
    pub details: String,
    /// UTC day of the run, shared by every record of that run
    pub scraped_date: NaiveDate,
}

impl ListingRecord {
    /// Create a record with every optional field empty.
    pub fn new(source: impl Into<String>, scraped_date: NaiveDate) -> Self {
        Self {
            source: source.into(),
            url: String::new(),
            title: String::new(),
            price: String::new(),
            details: String::new(),
            scraped_date,
        }
    }
}
