mod caster_config;
mod configuration;
mod configuration_error;
mod output_config;
mod prometheus_config;
mod receiver_config;

pub use caster_config::CasterConfig;
pub use configuration::Configuration;
pub use configuration_error::ConfigurationError;
pub use output_config::OutputConfig;
pub use prometheus_config::PrometheusConfig;
pub use receiver_config::ReceiverConfig;
pub use receiver_config::SerialSettings;

#[cfg(test)]
mod test;
