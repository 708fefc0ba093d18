mod exporter;
mod metrics;

pub use exporter::Exporter;
pub use metrics::Metrics;
