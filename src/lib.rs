//! netjmx - JMX metrics for netdata
//!
//! Collects MBean attributes from Java processes through a Jolokia agent and
//! reports them to netdata over its external plugin protocol.
//!
//! ## Example
//!
//! ```ignore
//! use netjmx::{JolokiaConnection, MBeanServerCollector, Printer, ServerConfig};
//! use std::{sync::Arc, time::Duration};
//!
//! let config = ServerConfig::new("tomcat", "http://localhost:8778/jolokia");
//! let connection = JolokiaConnection::new(&config.url, Duration::from_secs(5))?;
//! let mut collector = MBeanServerCollector::new(config, Arc::new(connection));
//! let mut printer = Printer::stdout();
//!
//! for chart in collector.initialize().await {
//!     printer.define_chart(chart)?;
//! }
//! for chart in collector.collect().await {
//!     printer.collect(chart)?;
//! }
//! ```

pub use netjmx_core::*;
