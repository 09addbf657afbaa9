//! HTTP API handlers for soundpool-si

pub mod dataset;
pub mod health;
pub mod upload;

pub use dataset::dataset_routes;
pub use health::health_routes;
pub use upload::upload_routes;
