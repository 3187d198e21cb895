#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use metricdag::registry::{CacheMode, Registry};

/// Shared log of compute-function invocations, in call order.
///
/// Entries are the names passed to [`RegistryBuilder::producer`] /
/// [`RegistryBuilder::metric`], so tests can assert both run-once behaviour
/// and relative ordering.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of the calls recorded so far.
pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Number of times `name` was invoked.
pub fn call_count(log: &CallLog, name: &str) -> usize {
    log.lock().unwrap().iter().filter(|c| c.as_str() == name).count()
}

/// A zero-argument compute function that records its invocation and yields
/// the artifact `tv_<name>`.
pub fn logged_fn(log: &CallLog, name: &str) -> impl Fn() -> String + Send + Sync + 'static {
    let log = Arc::clone(log);
    let name = name.to_string();
    move || {
        log.lock().unwrap().push(name.clone());
        format!("tv_{name}")
    }
}

/// Builder assembling a `Registry` of logged compute functions.
///
/// Every metric and producer added through the builder records invocations
/// into one shared [`CallLog`] and produces `tv_<name>` artifacts.
pub struct RegistryBuilder {
    registry: Registry,
    log: CallLog,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            log: new_call_log(),
        }
    }

    pub fn producer(mut self, name: &str, deps: &[&str]) -> Self {
        let f = logged_fn(&self.log, name);
        self.registry
            .register_producer(Some(name), f, deps, CacheMode::Auto)
            .expect("logged producer registration cannot fail");
        self
    }

    pub fn producer_with_cache(mut self, name: &str, deps: &[&str], cache: CacheMode) -> Self {
        let f = logged_fn(&self.log, name);
        self.registry
            .register_producer(Some(name), f, deps, cache)
            .expect("logged producer registration cannot fail");
        self
    }

    pub fn metric(mut self, name: &str, deps: &[&str]) -> Self {
        let f = logged_fn(&self.log, name);
        self.registry.register_metric(name, f, deps);
        self
    }

    pub fn build(self) -> (Registry, CallLog) {
        (self.registry, self.log)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
