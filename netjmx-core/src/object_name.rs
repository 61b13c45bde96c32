//! JMX object names.
//!
//! An object name addresses one MBean: a domain followed by a non-empty set of
//! `key=value` properties, e.g. `java.lang:type=MemoryPool,name=Metaspace`.
//! Property order is not significant; two names with the same domain and the
//! same properties compare equal.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// MBean that identifies the remote Java virtual machine.
pub const RUNTIME_OBJECT_NAME: &str = "java.lang:type=Runtime";

/// Attribute of [`RUNTIME_OBJECT_NAME`] holding the `pid@host` style runtime name.
pub const RUNTIME_NAME_ATTRIBUTE: &str = "Name";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is no valid JMX ObjectName: {reason}")]
pub struct MalformedObjectName {
    pub input: String,
    pub reason: &'static str,
}

/// A parsed, canonical MBean address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    domain: String,
    properties: BTreeMap<String, String>,
}

impl ObjectName {
    /// Parse an object name. Patterns (`*`, `?`) are rejected because a
    /// pattern cannot be read as a single attribute.
    pub fn parse(input: &str) -> Result<Self, MalformedObjectName> {
        let fail = |reason| MalformedObjectName {
            input: input.to_string(),
            reason,
        };

        if input.trim().is_empty() {
            return Err(fail("empty string"));
        }

        let (domain, key_properties) = input
            .split_once(':')
            .ok_or_else(|| fail("missing ':' after the domain"))?;

        if domain.contains(['*', '?']) {
            return Err(fail("patterns are not supported"));
        }
        if domain.contains('\n') {
            return Err(fail("domain contains a newline"));
        }
        if key_properties.is_empty() {
            return Err(fail("no key properties"));
        }

        let mut properties = BTreeMap::new();
        let mut rest = key_properties;
        loop {
            if rest == "*" {
                return Err(fail("patterns are not supported"));
            }

            let (key, after_key) = rest
                .split_once('=')
                .ok_or_else(|| fail("key property without '='"))?;

            if key.is_empty() {
                return Err(fail("empty key"));
            }
            if key.contains([',', ':', '*', '?', '"', '\n']) {
                return Err(fail("invalid character in key"));
            }

            let (value, remainder) = split_value(after_key).map_err(fail)?;

            if properties
                .insert(key.to_string(), value.to_string())
                .is_some()
            {
                return Err(fail("duplicate key"));
            }

            match remainder {
                Some(next) => rest = next,
                None => break,
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            properties,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Raw value of a key property. Quoted values keep their quotes.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The MBean describing the remote runtime.
    pub fn runtime() -> Self {
        let mut properties = BTreeMap::new();
        properties.insert("type".to_string(), "Runtime".to_string());
        Self {
            domain: "java.lang".to_string(),
            properties,
        }
    }
}

/// Splits one property value off the front of `s`.
///
/// Returns the value and the remaining properties (after the separating
/// comma), or `None` when the value was the last one.
fn split_value(s: &str) -> Result<(&str, Option<&str>), &'static str> {
    if s.starts_with('"') {
        let mut escaped = false;
        let mut end = None;
        for (i, c) in s.char_indices().skip(1) {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                '\n' => return Err("newline in quoted value"),
                _ => {}
            }
        }
        let end = end.ok_or("unterminated quoted value")?;
        let (value, after) = s.split_at(end + 1);
        return match after.strip_prefix(',') {
            Some(next) => Ok((value, Some(next))),
            None if after.is_empty() => Ok((value, None)),
            None => Err("characters after quoted value"),
        };
    }

    let (value, remainder) = match s.split_once(',') {
        Some((value, next)) => (value, Some(next)),
        None => (s, None),
    };

    if value.is_empty() {
        return Err("empty value");
    }
    if value.contains(['*', '?']) {
        return Err("patterns are not supported");
    }
    if value.contains(['=', ':', '"', '\n']) {
        return Err("invalid character in value");
    }

    Ok((value, remainder))
}

impl FromStr for ObjectName {
    type Err = MalformedObjectName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
