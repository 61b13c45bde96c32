//! Access to a remote MBean server.
//!
//! The collector only depends on the [`MBeanServerConnection`] trait. The
//! shipped implementation talks to a Jolokia agent over HTTP.

mod jolokia;

pub use jolokia::JolokiaConnection;

use crate::object_name::ObjectName;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("MBean '{0}' is not registered")]
    InstanceNotFound(String),

    #[error("MBean '{object_name}' has no attribute '{attribute}'")]
    AttributeNotFound {
        object_name: String,
        attribute: String,
    },

    #[error("Connection to MBean server failed: {0}")]
    Connection(String),

    #[error("MBean server raised {error_type}: {message}")]
    Remote { error_type: String, message: String },

    #[error("Invalid response from MBean server: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Value of one remote attribute, resolved at the connection boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Open-type composite data such as `HeapMemoryUsage`.
    Composite(BTreeMap<String, AttributeValue>),
    /// Anything the collector cannot chart; carries a type label.
    Other(String),
}

impl AttributeValue {
    /// Numeric view of the value. Booleans chart as 1 and 0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Item `key` of a composite value.
    pub fn item(&self, key: &str) -> Option<&AttributeValue> {
        match self {
            AttributeValue::Composite(items) => items.get(key),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            AttributeValue::Number(_) => "number",
            AttributeValue::Text(_) => "string",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Composite(_) => "composite",
            AttributeValue::Other(kind) => kind.as_str(),
        }
    }
}

/// A connection to one MBean server.
///
/// Every call is one blocking round-trip from the caller's point of view;
/// timeouts are the implementation's business.
#[async_trait]
pub trait MBeanServerConnection: Send + Sync {
    /// Read attribute `attribute` of MBean `name`.
    async fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<AttributeValue>;

    /// Release the connection. Called once, on shutdown.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number() {
        assert_eq!(AttributeValue::Number(12.5).as_number(), Some(12.5));
        assert_eq!(AttributeValue::Boolean(true).as_number(), Some(1.0));
        assert_eq!(AttributeValue::Boolean(false).as_number(), Some(0.0));
        assert_eq!(AttributeValue::Text("12".into()).as_number(), None);
    }

    #[test]
    fn test_composite_item() {
        let mut items = BTreeMap::new();
        items.insert("used".to_string(), AttributeValue::Number(42.0));
        let value = AttributeValue::Composite(items);

        assert_eq!(value.item("used"), Some(&AttributeValue::Number(42.0)));
        assert_eq!(value.item("max"), None);
        assert_eq!(AttributeValue::Number(1.0).item("used"), None);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(AttributeValue::Text("x".into()).type_name(), "string");
        assert_eq!(AttributeValue::Other("array".into()).type_name(), "array");
    }
}
