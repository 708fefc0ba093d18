use crate::configuration::CasterConfig;
use crate::configuration::ConfigurationError;
use crate::configuration::OutputConfig;
use crate::configuration::PrometheusConfig;
use crate::configuration::ReceiverConfig;

use serde::Deserialize;

use std::convert::TryFrom;
use std::fs;
use std::path::Path;

use tracing_subscriber::filter::EnvFilter;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Configuration {
    pub log_filter: Option<String>,
    pub receiver: ReceiverConfig,
    pub caster: Option<CasterConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub prometheus: Option<PrometheusConfig>,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Configuration, ConfigurationError> {
        let source = fs::read_to_string(path)?;

        parse(source)
    }

    /// Load the file named by the first command line argument.
    pub fn load_from_next_arg() -> Result<Configuration, ConfigurationError> {
        match std::env::args().nth(1) {
            None => Err(ConfigurationError::MissingPath),
            Some(f) => Configuration::load(f),
        }
    }
}

fn parse(source: String) -> Result<Configuration, ConfigurationError> {
    match toml::from_str(&source) {
        Err(e) => Err(ConfigurationError::from(e)),
        Ok(c) => Ok(c),
    }
}

impl TryFrom<&Configuration> for EnvFilter {
    type Error = ConfigurationError;

    fn try_from(configuration: &Configuration) -> Result<EnvFilter, ConfigurationError> {
        match &configuration.log_filter {
            Some(f) => match EnvFilter::try_new(f) {
                Ok(f) => Ok(f),
                Err(e) => Err(ConfigurationError::InvalidLogFilter(f.clone(), e)),
            },
            None => Ok(EnvFilter::new("info")),
        }
    }
}
