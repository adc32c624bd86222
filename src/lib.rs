pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod ingest;
pub mod loader;
pub mod report;
pub mod session;
pub mod state;
