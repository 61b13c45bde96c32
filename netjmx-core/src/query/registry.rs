use super::{AttributeQuery, QueryError};
use crate::object_name::ObjectName;
use crate::remote::MBeanServerConnection;
use std::collections::HashSet;
use std::ops::{Index, IndexMut};

/// Registry of the live queries against one MBean server.
///
/// Queries are kept in registration order, which is also the order a
/// collection cycle runs them in.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    queries: Vec<AttributeQuery>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The query for exactly this pair, if one is registered.
    pub fn find_query(&self, object_name: &ObjectName, attribute: &str) -> Option<&AttributeQuery> {
        self.queries.iter().find(|q| q.matches(object_name, attribute))
    }

    pub fn position(&self, object_name: &ObjectName, attribute: &str) -> Option<usize> {
        self.queries.iter().position(|q| q.matches(object_name, attribute))
    }

    /// Probe and store a new query, returning its position.
    ///
    /// An already registered pair is returned as is, so a pair never has two
    /// queries.
    pub async fn register_query(
        &mut self,
        connection: &dyn MBeanServerConnection,
        object_name: ObjectName,
        attribute: &str,
    ) -> Result<usize, QueryError> {
        if let Some(index) = self.position(&object_name, attribute) {
            return Ok(index);
        }

        let query = AttributeQuery::probe(connection, object_name, attribute).await?;
        self.queries.push(query);
        Ok(self.queries.len() - 1)
    }

    pub fn all_queries(&self) -> &[AttributeQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Drop the queries at `positions`, keeping the others in order.
    pub(crate) fn remove_positions(&mut self, positions: &HashSet<usize>) {
        let mut index = 0;
        self.queries.retain(|_| {
            let keep = !positions.contains(&index);
            index += 1;
            keep
        });
    }

    /// Drop queries no dimension subscribed to, returning how many went.
    pub(crate) fn prune_unsubscribed(&mut self) -> usize {
        let before = self.queries.len();
        self.queries.retain(|q| !q.subscriptions().is_empty());
        before - self.queries.len()
    }
}

impl Index<usize> for QueryRegistry {
    type Output = AttributeQuery;

    fn index(&self, index: usize) -> &AttributeQuery {
        &self.queries[index]
    }
}

impl IndexMut<usize> for QueryRegistry {
    fn index_mut(&mut self, index: usize) -> &mut AttributeQuery {
        &mut self.queries[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::AttributeValue;
    use crate::testing::FakeMBeanServer;

    const THREADING: &str = "java.lang:type=Threading";

    fn threading() -> ObjectName {
        ObjectName::parse(THREADING).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let server = FakeMBeanServer::new()
            .with_attribute(THREADING, "ThreadCount", AttributeValue::Number(12.0))
            .with_attribute(THREADING, "DaemonThreadCount", AttributeValue::Number(3.0));
        let mut registry = QueryRegistry::new();

        assert!(registry.find_query(&threading(), "ThreadCount").is_none());

        let first = registry
            .register_query(&server, threading(), "ThreadCount")
            .await
            .unwrap();
        let second = registry
            .register_query(&server, threading(), "DaemonThreadCount")
            .await
            .unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry[second].attribute(), "DaemonThreadCount");
        let found = registry.find_query(&threading(), "ThreadCount").unwrap();
        assert_eq!(found.attribute(), "ThreadCount");
        assert!(registry.find_query(&threading(), "PeakThreadCount").is_none());
    }

    #[tokio::test]
    async fn test_register_existing_pair_returns_same_query() {
        let server = FakeMBeanServer::new().with_attribute(THREADING, "ThreadCount", AttributeValue::Number(12.0));
        let mut registry = QueryRegistry::new();

        let first = registry
            .register_query(&server, threading(), "ThreadCount")
            .await
            .unwrap();
        let again = registry
            .register_query(&server, threading(), "ThreadCount")
            .await
            .unwrap();

        assert_eq!(first, again);
        assert_eq!(registry.len(), 1);
        assert_eq!(server.reads(THREADING, "ThreadCount"), 1);
    }

    #[tokio::test]
    async fn test_registration_rejected_by_server() {
        let server = FakeMBeanServer::new();
        let mut registry = QueryRegistry::new();

        let result = registry.register_query(&server, threading(), "ThreadCount").await;

        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_remove_positions_keeps_order() {
        let server = FakeMBeanServer::new()
            .with_attribute(THREADING, "ThreadCount", AttributeValue::Number(1.0))
            .with_attribute(THREADING, "DaemonThreadCount", AttributeValue::Number(2.0))
            .with_attribute(THREADING, "PeakThreadCount", AttributeValue::Number(3.0));
        let mut registry = QueryRegistry::new();
        for attribute in ["ThreadCount", "DaemonThreadCount", "PeakThreadCount"] {
            registry.register_query(&server, threading(), attribute).await.unwrap();
        }

        registry.remove_positions(&HashSet::from([1]));

        let attributes: Vec<&str> = registry.all_queries().iter().map(|q| q.attribute()).collect();
        assert_eq!(attributes, vec!["ThreadCount", "PeakThreadCount"]);
    }
}
