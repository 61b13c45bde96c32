use serde::{Deserialize, Serialize};
use std::fmt;

/// How the host turns collected values into the drawn series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DimensionAlgorithm {
    #[default]
    Absolute,
    Incremental,
    PercentageOfAbsoluteRow,
    PercentageOfIncrementalRow,
}

impl fmt::Display for DimensionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DimensionAlgorithm::Absolute => "absolute",
            DimensionAlgorithm::Incremental => "incremental",
            DimensionAlgorithm::PercentageOfAbsoluteRow => "percentage-of-absolute-row",
            DimensionAlgorithm::PercentageOfIncrementalRow => "percentage-of-incremental-row",
        })
    }
}

/// One series of a chart.
///
/// `multiplier` and `divisor` describe the scaling the query layer applied
/// before storing `current_value`; the dimension never rescales itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub id: String,
    pub name: Option<String>,
    pub algorithm: DimensionAlgorithm,
    pub multiplier: i64,
    pub divisor: i64,
    pub hidden: bool,
    /// Unset until the first successful query.
    pub current_value: Option<f64>,
}

impl Dimension {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            algorithm: DimensionAlgorithm::default(),
            multiplier: 1,
            divisor: 1,
            hidden: false,
            current_value: None,
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}
