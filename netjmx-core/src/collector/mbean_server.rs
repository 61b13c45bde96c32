use super::Collector;
use crate::config::{ChartConfig, DimensionConfig, ServerConfig};
use crate::logging::error_chain;
use crate::model::{Chart, Dimension};
use crate::object_name::{MalformedObjectName, ObjectName, RUNTIME_NAME_ATTRIBUTE, RUNTIME_OBJECT_NAME};
use crate::query::{DimensionRef, QueryError, QueryRegistry};
use crate::remote::{AttributeValue, MBeanServerConnection, RemoteError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    MalformedObjectName(#[from] MalformedObjectName),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Expected attribute '{attribute}' of MBean '{object_name}' to return a string. Instead it returned a '{found}'.")]
    UnexpectedType {
        object_name: String,
        attribute: String,
        found: String,
    },

    #[error("Could not close the MBean server connection")]
    Close(#[source] RemoteError),
}

/// Collects the charts of one MBean server.
///
/// The collector owns its registry and charts outright; it is driven by one
/// task at a time and needs no locking.
pub struct MBeanServerCollector {
    config: ServerConfig,
    connection: Arc<dyn MBeanServerConnection>,
    registry: QueryRegistry,
    charts: Vec<Chart>,
    initialized: bool,
    closed: bool,
}

impl MBeanServerCollector {
    pub fn new(config: ServerConfig, connection: Arc<dyn MBeanServerConnection>) -> Self {
        Self {
            config,
            connection,
            registry: QueryRegistry::new(),
            charts: Vec::new(),
            initialized: false,
            closed: false,
        }
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    pub fn query_count(&self) -> usize {
        self.registry.len()
    }

    /// Name of the remote Java virtual machine (`pid@host`), unique per
    /// process and therefore usable as its identifier.
    pub async fn get_runtime_name(&self) -> Result<String, CollectorError> {
        match self
            .get_attribute(&ObjectName::runtime(), RUNTIME_NAME_ATTRIBUTE)
            .await
        {
            AttributeValue::Text(name) => Ok(name),
            other => Err(CollectorError::UnexpectedType {
                object_name: RUNTIME_OBJECT_NAME.to_string(),
                attribute: RUNTIME_NAME_ATTRIBUTE.to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Read one attribute outside the collection cycle.
    ///
    /// A failed read yields `0` instead of an error.
    pub async fn get_attribute(&self, name: &ObjectName, attribute: &str) -> AttributeValue {
        match self.connection.get_attribute(name, attribute).await {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    object_name = %name,
                    attribute,
                    error = %error_chain(&e),
                    "Attribute read failed, using 0"
                );
                AttributeValue::Number(0.0)
            }
        }
    }

    /// Build charts, dimensions and queries from the server configuration.
    ///
    /// A dimension whose object name does not parse, whose attribute cannot be
    /// read or whose value cannot be charted is skipped; its chart is kept.
    /// Calling this again returns the charts built the first time.
    pub async fn initialize(&mut self) -> &[Chart] {
        if self.initialized {
            return &self.charts;
        }
        self.initialized = true;

        for chart_config in &self.config.charts {
            let mut chart = Self::initialize_chart(&self.config.name, chart_config);
            if self.charts.iter().any(|c| c.type_id == chart.type_id && c.id == chart.id) {
                warn!(
                    server = %self.config.name,
                    chart = %chart.full_id(),
                    "Chart is already defined. Skipping..."
                );
                continue;
            }
            let chart_index = self.charts.len();

            for dimension_config in &chart_config.dimensions {
                let dimension_ref = DimensionRef {
                    chart: chart_index,
                    dimension: chart.dimensions.len(),
                };

                if let Err(e) = attach_dimension(
                    &mut self.registry,
                    self.connection.as_ref(),
                    dimension_config,
                    dimension_ref,
                )
                .await
                {
                    warn!(
                        server = %self.config.name,
                        chart = %chart_config.id,
                        dimension = %dimension_config.name,
                        object_name = %dimension_config.from,
                        attribute = %dimension_config.value,
                        error = %error_chain(&e),
                        "Could not query one dimension. Skipping..."
                    );
                    continue;
                }

                chart
                    .dimensions
                    .push(Self::initialize_dimension(chart_config, dimension_config));
            }

            self.charts.push(chart);
        }

        let pruned = self.registry.prune_unsubscribed();
        if pruned > 0 {
            debug!(server = %self.config.name, pruned, "Dropped queries without dimensions");
        }

        info!(
            server = %self.config.name,
            charts = self.charts.len(),
            queries = self.registry.len(),
            "Collector initialized"
        );

        &self.charts
    }

    pub(crate) fn initialize_chart(server_name: &str, config: &ChartConfig) -> Chart {
        let mut chart = Chart::new(format!("jmx_{}", server_name), config.id.clone());
        chart.name = config.name.clone();
        chart.title = config.title.clone();
        chart.units = config.units.clone();
        chart.family = Some(config.family.clone());
        chart.context = server_name.to_string();
        chart.chart_type = config.chart_type;
        if let Some(priority) = config.priority {
            chart.priority = priority;
        }
        chart.update_every = config.update_every;
        chart
    }

    pub(crate) fn initialize_dimension(chart_config: &ChartConfig, config: &DimensionConfig) -> Dimension {
        let mut dimension = Dimension::new(config.name.clone());
        dimension.name = Some(config.name.clone());
        dimension.algorithm = chart_config.dimension_algorithm;
        dimension.multiplier = config.multiplier;
        dimension.divisor = config.divisor;
        dimension.hidden = config.hidden;
        dimension
    }

    /// Run every query once and return the updated charts.
    ///
    /// A query that fails is dropped for good; its dimensions keep their last
    /// value. Queries are only removed once the whole cycle has run.
    pub async fn collect(&mut self) -> &[Chart] {
        let mut failed = HashSet::new();

        for (index, query) in self.registry.all_queries().iter().enumerate() {
            if let Err(e) = query.query(self.connection.as_ref(), &mut self.charts).await {
                warn!(
                    server = %self.config.name,
                    object_name = %query.object_name(),
                    attribute = query.attribute(),
                    error = %error_chain(&e),
                    "Stop collecting value"
                );
                failed.insert(index);
            }
        }

        if !failed.is_empty() {
            self.registry.remove_positions(&failed);
        }
        debug!(
            server = %self.config.name,
            queries = self.registry.len(),
            "Collection cycle finished"
        );

        &self.charts
    }

    /// Close the connection. Only the first call reaches the connection.
    pub async fn close(&mut self) -> Result<(), CollectorError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.connection.close().await.map_err(CollectorError::Close)
    }

    /// [`close`](Self::close), logging instead of returning a failure.
    pub async fn cleanup(&mut self) {
        if let Err(e) = self.close().await {
            warn!(
                server = %self.config.name,
                error = %error_chain(&e),
                "Could not cleanup MBeanServerCollector"
            );
        }
    }
}

/// Wire one configured dimension to its query.
async fn attach_dimension(
    registry: &mut QueryRegistry,
    connection: &dyn MBeanServerConnection,
    config: &DimensionConfig,
    dimension: DimensionRef,
) -> Result<(), CollectorError> {
    let object_name = ObjectName::parse(&config.from)?;

    let index = match registry.position(&object_name, &config.value) {
        Some(index) => index,
        None => {
            registry
                .register_query(connection, object_name, &config.value)
                .await?
        }
    };

    registry[index].subscribe(dimension, config.multiplier, config.divisor)?;
    Ok(())
}

#[async_trait]
impl Collector for MBeanServerCollector {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn initialize(&mut self) -> &[Chart] {
        MBeanServerCollector::initialize(self).await
    }

    async fn collect(&mut self) -> &[Chart] {
        MBeanServerCollector::collect(self).await
    }

    async fn cleanup(&mut self) {
        MBeanServerCollector::cleanup(self).await
    }
}
