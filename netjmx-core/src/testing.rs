//! In-memory MBean server for unit tests.

use crate::object_name::ObjectName;
use crate::remote::{AttributeValue, MBeanServerConnection, RemoteError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

type Key = (String, String);

fn key(object_name: &str, attribute: &str) -> Key {
    let canonical = ObjectName::parse(object_name)
        .map(|name| name.to_string())
        .unwrap_or_else(|_| object_name.to_string());
    (canonical, attribute.to_string())
}

pub(crate) fn composite(items: &[(&str, f64)]) -> AttributeValue {
    AttributeValue::Composite(
        items
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::Number(*v)))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[derive(Default)]
pub(crate) struct FakeMBeanServer {
    attributes: Mutex<HashMap<Key, AttributeValue>>,
    reads: Mutex<HashMap<Key, usize>>,
    closes: AtomicUsize,
    fail_close: bool,
    stalled: AtomicBool,
}

impl FakeMBeanServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(self, object_name: &str, attribute: &str, value: AttributeValue) -> Self {
        self.set(object_name, attribute, value);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn set(&self, object_name: &str, attribute: &str, value: AttributeValue) {
        self.attributes
            .lock()
            .unwrap()
            .insert(key(object_name, attribute), value);
    }

    /// Unregister an attribute; later reads fail with `AttributeNotFound`.
    pub fn remove(&self, object_name: &str, attribute: &str) {
        self.attributes
            .lock()
            .unwrap()
            .remove(&key(object_name, attribute));
    }

    /// Make every later read hang until [`resume`](Self::resume).
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.stalled.store(false, Ordering::SeqCst);
    }

    pub fn reads(&self, object_name: &str, attribute: &str) -> usize {
        self.reads
            .lock()
            .unwrap()
            .get(&key(object_name, attribute))
            .copied()
            .unwrap_or(0)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MBeanServerConnection for FakeMBeanServer {
    async fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<AttributeValue> {
        let key = (name.to_string(), attribute.to_string());
        *self.reads.lock().unwrap().entry(key.clone()).or_default() += 1;
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        self.attributes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| RemoteError::AttributeNotFound {
                object_name: name.to_string(),
                attribute: attribute.to_string(),
            })
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(RemoteError::Connection("connection reset".to_string()));
        }
        Ok(())
    }
}
