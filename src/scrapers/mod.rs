pub mod browser;
pub mod site;
pub mod traits;
pub mod user_agent;

pub use browser::ChromeLauncher;
pub use site::SiteScraper;
pub use traits::{BrowserLauncher, PageDriver};
