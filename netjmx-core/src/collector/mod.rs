//! Collectors turn configuration into charts and keep their values current.

mod mbean_server;

pub use mbean_server::{CollectorError, MBeanServerCollector};

use crate::model::Chart;
use async_trait::async_trait;

/// A source of charts driven by the plugin loop.
///
/// `initialize` runs once, then `collect` once per interval, strictly one
/// after the other. `cleanup` runs on shutdown and never fails.
#[async_trait]
pub trait Collector: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Build the charts. Problems with single dimensions are logged and
    /// skipped; they never fail the whole collector.
    async fn initialize(&mut self) -> &[Chart];

    /// Refresh every chart value and return the charts.
    async fn collect(&mut self) -> &[Chart];

    /// Release resources.
    async fn cleanup(&mut self);
}
