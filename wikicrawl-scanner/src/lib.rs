pub mod error;
pub mod fetcher;
pub mod wiki;

pub use error::FetchError;
pub use fetcher::LinkFetcher;
pub use wiki::WikiFetcher;
