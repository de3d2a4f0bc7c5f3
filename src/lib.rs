pub mod browser;
pub mod config;
pub mod fetch;
pub mod output;
pub mod scoring;
pub mod server;
pub mod source;
