pub mod config;
pub mod crawl;
pub mod error;
pub mod fetcher;
pub mod monitor;
pub mod notifier;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod testing;
