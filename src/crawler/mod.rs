pub mod config;
pub mod fetch;
pub mod resolve;
pub mod runner;


pub use config::{CrawlerConfig, LINK_REQUEST_TIMEOUT_SEC, MAX_LINK_RETRIES, ROOT_TITLE};
pub use fetch::{FetchError, build_client, fetch_document};
pub use resolve::{
    RegionCounters, ResolveError, Resolved, construct_url, next_link_candidate, resolve_first_link,
};
pub use runner::{WalkError, WalkOutcome, run_walk, run_walks};
