// Application layer - Use cases and the traits they depend on
pub mod chart;
pub mod metadata;
pub mod metrics_repository;
pub mod panel_service;
pub mod range_fetcher;
pub mod resize;
pub mod series_sync;

#[cfg(test)]
pub mod testing;
