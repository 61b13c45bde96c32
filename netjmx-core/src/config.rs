use crate::model::{ChartType, DimensionAlgorithm};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration of the whole plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Seconds between two collection cycles.
    #[serde(default = "default_update_every")]
    pub update_every: u64,

    /// Charts collected from every server, ahead of the server's own charts.
    #[serde(default)]
    pub common_charts: Vec<ChartConfig>,

    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

/// One MBean server to collect from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique name, used in chart types (`jmx_<name>`).
    pub name: String,
    /// URL of the Jolokia agent, e.g. `http://localhost:8778/jolokia`
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub title: String,
    pub units: String,
    pub family: String,
    #[serde(default)]
    pub chart_type: ChartType,
    /// Left unset, the host's default priority applies.
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub update_every: Option<u32>,
    /// Algorithm of every dimension of this chart.
    #[serde(default)]
    pub dimension_algorithm: DimensionAlgorithm,
    #[serde(default)]
    pub dimensions: Vec<DimensionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Id and display name of the dimension.
    pub name: String,
    /// Object name of the MBean to read.
    pub from: String,
    /// Attribute to read; `Attribute.key` selects an item of composite data.
    pub value: String,
    #[serde(default = "default_scale")]
    pub multiplier: i64,
    #[serde(default = "default_scale")]
    pub divisor: i64,
    #[serde(default)]
    pub hidden: bool,
}

fn default_update_every() -> u64 {
    1
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_scale() -> i64 {
    1
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            update_every: default_update_every(),
            common_charts: Vec::new(),
            servers: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: PluginConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check what serde cannot: intervals and server names.
    pub fn validate(&self) -> Result<()> {
        if self.update_every == 0 {
            return Err(ConfigError::Invalid("update_every must be positive".to_string()));
        }

        let mut names = HashSet::new();
        for server in &self.servers {
            if server.name.trim().is_empty() {
                return Err(ConfigError::Invalid("server name must not be empty".to_string()));
            }
            if server.name.contains(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "server name '{}' must not contain whitespace",
                    server.name
                )));
            }
            if !names.insert(server.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "server name '{}' is used twice",
                    server.name
                )));
            }
        }

        Ok(())
    }

    /// Servers with the common charts folded in.
    pub fn effective_servers(&self) -> Vec<ServerConfig> {
        self.servers
            .iter()
            .map(|server| server.clone().with_common_charts(&self.common_charts))
            .collect()
    }

    /// Set the collection interval in seconds.
    pub fn with_update_every(mut self, update_every: u64) -> Self {
        self.update_every = update_every;
        self
    }
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
            charts: Vec::new(),
        }
    }

    /// Prepend `common` to this server's charts.
    pub fn with_common_charts(mut self, common: &[ChartConfig]) -> Self {
        let own = std::mem::take(&mut self.charts);
        self.charts = common.iter().cloned().chain(own).collect();
        self
    }

    pub fn with_chart(mut self, chart: ChartConfig) -> Self {
        self.charts.push(chart);
        self
    }
}

impl ChartConfig {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        units: impl Into<String>,
        family: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            title: title.into(),
            units: units.into(),
            family: family.into(),
            chart_type: ChartType::default(),
            priority: None,
            update_every: None,
            dimension_algorithm: DimensionAlgorithm::default(),
            dimensions: Vec::new(),
        }
    }

    pub fn with_dimension(mut self, dimension: DimensionConfig) -> Self {
        self.dimensions.push(dimension);
        self
    }
}

impl DimensionConfig {
    pub fn new(name: impl Into<String>, from: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            value: value.into(),
            multiplier: default_scale(),
            divisor: default_scale(),
            hidden: false,
        }
    }

    pub fn with_scale(mut self, multiplier: i64, divisor: i64) -> Self {
        self.multiplier = multiplier;
        self.divisor = divisor;
        self
    }
}
