//! HTTP connector for a Jolokia JMX agent.
//!
//! Each attribute read is one POSTed `read` request against the agent URL.

use super::{AttributeValue, MBeanServerConnection, RemoteError, Result};
use crate::object_name::ObjectName;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ReadRequest<'a> {
    #[serde(rename = "type")]
    request_type: &'static str,
    mbean: String,
    attribute: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    status: u16,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Connection to the Jolokia agent of one Java process.
pub struct JolokiaConnection {
    client: Client,
    url: String,
    credentials: Option<(String, String)>,
}

impl JolokiaConnection {
    /// Create a connection to the agent at `url` (e.g. `http://localhost:8778/jolokia`).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            credentials: None,
        })
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

#[async_trait]
impl MBeanServerConnection for JolokiaConnection {
    async fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<AttributeValue> {
        let body = ReadRequest {
            request_type: "read",
            mbean: name.to_string(),
            attribute,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Connection(format!(
                "HTTP request failed with status {}",
                response.status()
            )));
        }

        let response: ReadResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        into_attribute(response, name, attribute)
    }

    async fn close(&self) -> Result<()> {
        // Plain HTTP keeps no session with the agent.
        debug!(url = %self.url, "Closing Jolokia connection");
        Ok(())
    }
}

fn into_attribute(response: ReadResponse, name: &ObjectName, attribute: &str) -> Result<AttributeValue> {
    if response.status != 200 {
        let error_type = response.error_type.unwrap_or_default();
        let message = response.error.unwrap_or_default();

        return Err(if error_type.contains("InstanceNotFoundException") {
            RemoteError::InstanceNotFound(name.to_string())
        } else if error_type.contains("AttributeNotFoundException") {
            RemoteError::AttributeNotFound {
                object_name: name.to_string(),
                attribute: attribute.to_string(),
            }
        } else {
            RemoteError::Remote {
                error_type,
                message,
            }
        });
    }

    response
        .value
        .map(convert_value)
        .ok_or_else(|| RemoteError::InvalidResponse("response carries no value".to_string()))
}

fn convert_value(value: Value) -> AttributeValue {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(n) => AttributeValue::Number(n),
            None => AttributeValue::Other("number".to_string()),
        },
        Value::String(s) => AttributeValue::Text(s),
        Value::Bool(b) => AttributeValue::Boolean(b),
        Value::Object(items) => AttributeValue::Composite(
            items
                .into_iter()
                .map(|(key, value)| (key, convert_value(value)))
                .collect(),
        ),
        Value::Array(_) => AttributeValue::Other("array".to_string()),
        Value::Null => AttributeValue::Other("null".to_string()),
    }
}
