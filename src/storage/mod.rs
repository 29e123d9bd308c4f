pub mod database;
pub mod export;

pub use database::ListingStore;
pub use export::{export_path, write_csv};
