pub mod cache;
pub mod channel;
pub mod clipper;
pub mod config;
pub mod download;
pub mod error;
pub mod media;
pub mod metrics;
pub mod playlist;
pub mod server;
