//! HTTP transport for a ledger node: the axum routes other nodes and the CLI
//! talk to, and the reqwest client used to fetch peers' chains.

pub mod api;
pub mod constants;
pub mod fetcher;

pub use api::router;
pub use fetcher::HttpChainFetcher;
