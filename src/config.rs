use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ConfigError;

/// Which input a request's strategy is chosen from when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPrecedence {
    Html,
    Markdown,
}

/// Points removed from a record's quality contribution per soft violation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SoftWeights {
    pub short_description: u8,
    pub missing_location: u8,
    pub missing_pay: u8,
    pub truncated_description: u8,
}

impl Default for SoftWeights {
    fn default() -> Self {
        SoftWeights {
            short_description: 20,
            missing_location: 10,
            missing_pay: 10,
            truncated_description: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub description_max_chars: usize,
    pub min_description_chars: usize,
    pub metrics_capacity: usize,
    pub input_precedence: InputPrecedence,
    pub fallback_to_other_input: bool,
    pub weights: SoftWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            description_max_chars: 2000,
            min_description_chars: 20,
            metrics_capacity: 1000,
            input_precedence: InputPrecedence::Html,
            fallback_to_other_input: true,
            weights: SoftWeights::default(),
        }
    }
}

impl Settings {
    /// Load from an optional `listings.{toml,json,yaml}` file and `LISTINGS_*`
    /// environment variables (nested keys use `__`, e.g. `LISTINGS_WEIGHTS__MISSING_PAY`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Some("listings"))
    }

    pub fn load_from(file_stem: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(stem) = file_stem {
            builder = builder.add_source(File::with_name(stem).required(false));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("LISTINGS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.description_max_chars == 0 {
            return Err(ConfigError::Invalid {
                key: "description_max_chars",
                reason: "must be greater than zero".into(),
            });
        }
        if self.metrics_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "metrics_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
