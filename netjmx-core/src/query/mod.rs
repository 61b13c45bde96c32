//! Attribute queries and the registry that deduplicates them.
//!
//! One [`AttributeQuery`] exists per (object name, attribute) pair. Every
//! dimension reading that pair subscribes to the same query, so N dimensions
//! cost one remote read per cycle.

mod registry;

pub use registry::QueryRegistry;

use crate::model::Chart;
use crate::object_name::ObjectName;
use crate::remote::{AttributeValue, MBeanServerConnection, RemoteError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Could not read attribute '{attribute}' of '{object_name}'")]
    Remote {
        object_name: String,
        attribute: String,
        #[source]
        source: RemoteError,
    },

    #[error("Attribute '{attribute}' of '{object_name}' returned a '{found}' instead of a number")]
    NotNumeric {
        object_name: String,
        attribute: String,
        found: String,
    },

    #[error("Attribute '{attribute}' of '{object_name}' has no item '{key}'")]
    MissingItem {
        object_name: String,
        attribute: String,
        key: String,
    },

    #[error("Divisor of a dimension on attribute '{attribute}' is zero")]
    ZeroDivisor { attribute: String },
}

/// Position of a dimension inside the collector's chart list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionRef {
    pub chart: usize,
    pub dimension: usize,
}

/// A dimension fed by a query, with the scaling applied on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub dimension: DimensionRef,
    pub multiplier: i64,
    pub divisor: i64,
}

impl Subscription {
    /// Multiplier first, then divisor.
    pub fn scale(&self, value: f64) -> f64 {
        value * self.multiplier as f64 / self.divisor as f64
    }
}

/// Reads one attribute of one MBean and fans the value out to its subscribers.
///
/// The attribute may be a dotted path (`HeapMemoryUsage.used`): the part
/// before the first `.` is read remotely and the rest selects an item of the
/// returned composite value.
#[derive(Debug)]
pub struct AttributeQuery {
    object_name: ObjectName,
    attribute: String,
    subscriptions: Vec<Subscription>,
    probe: AttributeValue,
}

impl AttributeQuery {
    /// Create a query after checking that the attribute can be read at all.
    pub async fn probe(
        connection: &dyn MBeanServerConnection,
        object_name: ObjectName,
        attribute: &str,
    ) -> Result<Self, QueryError> {
        let (remote_attribute, _) = split_path(attribute);
        let probe = connection
            .get_attribute(&object_name, remote_attribute)
            .await
            .map_err(|source| QueryError::Remote {
                object_name: object_name.to_string(),
                attribute: attribute.to_string(),
                source,
            })?;

        Ok(Self {
            object_name,
            attribute: attribute.to_string(),
            subscriptions: Vec::new(),
            probe,
        })
    }

    pub fn object_name(&self) -> &ObjectName {
        &self.object_name
    }

    /// The attribute as configured, including any composite path.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn matches(&self, object_name: &ObjectName, attribute: &str) -> bool {
        self.object_name == *object_name && self.attribute == attribute
    }

    /// Subscribe a dimension. Fails when the divisor is zero or the value seen
    /// at registration cannot be charted.
    pub fn subscribe(
        &mut self,
        dimension: DimensionRef,
        multiplier: i64,
        divisor: i64,
    ) -> Result<(), QueryError> {
        if divisor == 0 {
            return Err(QueryError::ZeroDivisor {
                attribute: self.attribute.clone(),
            });
        }
        self.extract(&self.probe)?;

        self.subscriptions.push(Subscription {
            dimension,
            multiplier,
            divisor,
        });
        Ok(())
    }

    /// Read a fresh value and store it, scaled, in every subscribed dimension.
    ///
    /// Either every subscriber is updated or, on error, none is.
    pub async fn query(
        &self,
        connection: &dyn MBeanServerConnection,
        charts: &mut [Chart],
    ) -> Result<(), QueryError> {
        let (remote_attribute, _) = split_path(&self.attribute);
        let value = connection
            .get_attribute(&self.object_name, remote_attribute)
            .await
            .map_err(|source| QueryError::Remote {
                object_name: self.object_name.to_string(),
                attribute: self.attribute.clone(),
                source,
            })?;
        let number = self.extract(&value)?;

        for subscription in &self.subscriptions {
            let DimensionRef { chart, dimension } = subscription.dimension;
            if let Some(dimension) = charts
                .get_mut(chart)
                .and_then(|c| c.dimensions.get_mut(dimension))
            {
                dimension.current_value = Some(subscription.scale(number));
            }
        }

        Ok(())
    }

    fn extract(&self, value: &AttributeValue) -> Result<f64, QueryError> {
        let value = match split_path(&self.attribute) {
            (_, Some(key)) => value.item(key).ok_or_else(|| QueryError::MissingItem {
                object_name: self.object_name.to_string(),
                attribute: self.attribute.clone(),
                key: key.to_string(),
            })?,
            (_, None) => value,
        };

        value.as_number().ok_or_else(|| QueryError::NotNumeric {
            object_name: self.object_name.to_string(),
            attribute: self.attribute.clone(),
            found: value.type_name().to_string(),
        })
    }
}

fn split_path(attribute: &str) -> (&str, Option<&str>) {
    match attribute.split_once('.') {
        Some((attribute, key)) => (attribute, Some(key)),
        None => (attribute, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimension;
    use crate::testing::{composite, FakeMBeanServer};

    const MEMORY: &str = "java.lang:type=Memory";

    fn charts_with(dimensions: usize) -> Vec<Chart> {
        let mut chart = Chart::new("jmx_test", "chart");
        for i in 0..dimensions {
            chart.dimensions.push(Dimension::new(format!("dim{}", i)));
        }
        vec![chart]
    }

    fn at(dimension: usize) -> DimensionRef {
        DimensionRef {
            chart: 0,
            dimension,
        }
    }

    #[test]
    fn test_scale_multiplies_before_dividing() {
        let subscription = Subscription {
            dimension: at(0),
            multiplier: 3,
            divisor: 2,
        };
        assert_eq!(subscription.scale(5.0), 7.5);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("HeapMemoryUsage.used"), ("HeapMemoryUsage", Some("used")));
        assert_eq!(split_path("Uptime"), ("Uptime", None));
    }

    #[tokio::test]
    async fn test_query_applies_scaling_per_subscription() {
        let server = FakeMBeanServer::new().with_attribute(MEMORY, "Value", AttributeValue::Number(100.0));
        let mut query = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Value")
            .await
            .unwrap();
        query.subscribe(at(0), 2, 5).unwrap();
        query.subscribe(at(1), 1, 1).unwrap();

        let mut charts = charts_with(2);
        query.query(&server, &mut charts).await.unwrap();

        assert_eq!(charts[0].dimensions[0].current_value, Some(40.0));
        assert_eq!(charts[0].dimensions[1].current_value, Some(100.0));
    }

    #[tokio::test]
    async fn test_composite_path_reads_root_attribute() {
        let server = FakeMBeanServer::new().with_attribute(
            MEMORY,
            "HeapMemoryUsage",
            composite(&[("used", 10.0), ("max", 20.0)]),
        );
        let mut query = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "HeapMemoryUsage.used")
            .await
            .unwrap();
        query.subscribe(at(0), 1, 1).unwrap();

        let mut charts = charts_with(1);
        query.query(&server, &mut charts).await.unwrap();

        assert_eq!(charts[0].dimensions[0].current_value, Some(10.0));
        assert_eq!(server.reads(MEMORY, "HeapMemoryUsage"), 2);
    }

    #[tokio::test]
    async fn test_probe_fails_for_unknown_attribute() {
        let server = FakeMBeanServer::new();
        let err = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Nope")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Remote { .. }));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_zero_divisor() {
        let server = FakeMBeanServer::new().with_attribute(MEMORY, "Value", AttributeValue::Number(1.0));
        let mut query = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Value")
            .await
            .unwrap();

        let err = query.subscribe(at(0), 1, 0).unwrap_err();
        assert!(matches!(err, QueryError::ZeroDivisor { .. }));
        assert!(query.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_rejects_non_numeric_value() {
        let server = FakeMBeanServer::new()
            .with_attribute(MEMORY, "Text", AttributeValue::Text("x".into()))
            .with_attribute(MEMORY, "Usage", composite(&[("used", 1.0)]));

        let mut text = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Text")
            .await
            .unwrap();
        assert!(matches!(
            text.subscribe(at(0), 1, 1),
            Err(QueryError::NotNumeric { .. })
        ));

        let mut whole = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Usage")
            .await
            .unwrap();
        assert!(matches!(
            whole.subscribe(at(0), 1, 1),
            Err(QueryError::NotNumeric { .. })
        ));

        let mut missing = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Usage.max")
            .await
            .unwrap();
        assert!(matches!(
            missing.subscribe(at(0), 1, 1),
            Err(QueryError::MissingItem { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_query_leaves_values_untouched() {
        let server = FakeMBeanServer::new().with_attribute(MEMORY, "Value", AttributeValue::Number(7.0));
        let mut query = AttributeQuery::probe(&server, ObjectName::parse(MEMORY).unwrap(), "Value")
            .await
            .unwrap();
        query.subscribe(at(0), 1, 1).unwrap();

        let mut charts = charts_with(1);
        query.query(&server, &mut charts).await.unwrap();

        server.set(MEMORY, "Value", AttributeValue::Text("broken".into()));
        assert!(query.query(&server, &mut charts).await.is_err());
        assert_eq!(charts[0].dimensions[0].current_value, Some(7.0));
    }
}
