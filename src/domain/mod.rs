// Domain layer - Pure data model and transforms
pub mod dashboard;
pub mod export;
pub mod format;
pub mod frame;
pub mod query;
pub mod series;
