use super::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority the reporting host assigns when a chart does not set one.
pub const DEFAULT_PRIORITY: u32 = 1000;

/// How the host draws a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Area,
    Stacked,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Stacked => "stacked",
        })
    }
}

/// A group of related dimensions drawn together.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Namespace of the chart, scoped to one server.
    pub type_id: String,
    pub id: String,
    pub name: Option<String>,
    pub title: String,
    pub units: String,
    pub family: Option<String>,
    pub context: String,
    pub chart_type: ChartType,
    pub priority: u32,
    pub update_every: Option<u32>,
    pub dimensions: Vec<Dimension>,
}

impl Chart {
    pub fn new(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: id.into(),
            name: None,
            title: String::new(),
            units: String::new(),
            family: None,
            context: String::new(),
            chart_type: ChartType::default(),
            priority: DEFAULT_PRIORITY,
            update_every: None,
            dimensions: Vec::new(),
        }
    }

    /// `type.id`, the identifier the host knows the chart by.
    pub fn full_id(&self) -> String {
        format!("{}.{}", self.type_id, self.id)
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    pub fn has_family(&self) -> bool {
        self.family.as_deref().is_some_and(|f| !f.is_empty())
    }

    pub fn has_update_every(&self) -> bool {
        self.update_every.is_some_and(|u| u > 0)
    }

    pub fn dimension(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }
}
