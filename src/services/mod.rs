pub mod downloader;
pub mod droid;
pub mod extractor;
pub mod results_scraper;
pub mod search_form;

pub use downloader::*;
pub use droid::*;
pub use extractor::*;
pub use results_scraper::*;
pub use search_form::*;
