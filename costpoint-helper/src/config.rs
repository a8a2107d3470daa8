use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use costpoint::{AutomationConfig, Sequencing, WaitStrategy};
use serde::Deserialize;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    /// Endpoint serving the pending entries as a JSON array.
    pub entries_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub automation: AutomationSettings,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SequencingMode {
    Paired,
    Sequential,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    Fixed,
    Poll,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AutomationSettings {
    pub sequencing: SequencingMode,
    pub wait: WaitMode,
    /// Sleep before each note editor step when `wait` is `fixed`.
    pub note_editor_delay_ms: u64,
    /// Pause between the writes of a pair when `sequencing` is `paired`.
    pub pair_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub marker_class: String,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            sequencing: SequencingMode::Paired,
            wait: WaitMode::Fixed,
            note_editor_delay_ms: 500,
            pair_delay_ms: 500,
            poll_interval_ms: 50,
            poll_timeout_ms: 2000,
            marker_class: costpoint::page::DEFAULT_MARKER_CLASS.to_string(),
        }
    }
}

impl AutomationSettings {
    pub fn to_config(&self) -> AutomationConfig {
        let sequencing = match self.sequencing {
            SequencingMode::Paired => Sequencing::Paired {
                pause: Duration::from_millis(self.pair_delay_ms),
            },
            SequencingMode::Sequential => Sequencing::Sequential,
        };
        let wait = match self.wait {
            WaitMode::Fixed => WaitStrategy::Fixed(Duration::from_millis(self.note_editor_delay_ms)),
            WaitMode::Poll => WaitStrategy::Poll {
                interval: Duration::from_millis(self.poll_interval_ms),
                timeout: Duration::from_millis(self.poll_timeout_ms),
            },
        };

        AutomationConfig {
            sequencing,
            wait,
            marker_class: self.marker_class.clone(),
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("invalid APP_ENVIRONMENT: {}", e)))?;

    read_config_from(&base_path.join("config"), environment)
}

/// Layers `base.yaml`, `<environment>.yaml` and `COSTPOINT_*` variables, later
/// sources winning. Both files are optional.
pub fn read_config_from(
    config_directory: &Path,
    environment: Environment,
) -> Result<Settings, config::ConfigError> {
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .set_default("entries_url", "http://localhost:3000/costpoint_entries")?
        .add_source(config::File::from(config_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("COSTPOINT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, Clone, Copy, EnumString, PartialEq, Eq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
