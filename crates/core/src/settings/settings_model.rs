//! Configuration model for the goals engine.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::utils::time_utils::DEFAULT_STUDY_TZ;

/// Tunables for the goal service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalEngineConfig {
    /// Timezone used to turn activity timestamps into study days (default: America/Sao_Paulo)
    pub timezone: Tz,

    /// Seconds a cached goal listing stays valid (default: 60)
    pub list_cache_ttl_secs: u64,

    /// chrono format used for the date part of instance names (default: %d/%m/%Y)
    pub instance_name_date_format: String,
}

impl Default for GoalEngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_STUDY_TZ,
            list_cache_ttl_secs: 60,
            instance_name_date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl GoalEngineConfig {
    /// Parses a JSON document; missing keys fall back to defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: GoalEngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instance_name_date_format.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "instanceNameDateFormat must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
