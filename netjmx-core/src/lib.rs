//! netjmx-core - JMX collection engine for netdata
//!
//! Maps declarative chart/dimension definitions onto a deduplicated set of
//! attribute queries against an MBean server and refreshes them once per
//! collection cycle:
//! - Object name parsing
//! - MBean server connections (Jolokia over HTTP)
//! - Query registry and fan-out to dimensions
//! - The collector driving initialization and collection
//! - The netdata plugin protocol writer
//!
//! ## Primary API
//!
//! Build an [`MBeanServerCollector`] per server from a [`ServerConfig`], call
//! `initialize()` once and `collect()` once per interval, and hand the
//! returned charts to a [`Printer`].

pub mod collector;
pub mod config;
pub mod logging;
pub mod model;
pub mod object_name;
pub mod printer;
pub mod query;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Collector, CollectorError, MBeanServerCollector};
pub use config::{ChartConfig, ConfigError, DimensionConfig, PluginConfig, ServerConfig};
pub use model::{Chart, ChartType, Dimension, DimensionAlgorithm, DEFAULT_PRIORITY};
pub use object_name::{MalformedObjectName, ObjectName};
pub use printer::Printer;
pub use query::{AttributeQuery, DimensionRef, QueryError, QueryRegistry, Subscription};
pub use remote::{AttributeValue, JolokiaConnection, MBeanServerConnection, RemoteError};
