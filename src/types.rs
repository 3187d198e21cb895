// src/types.rs

use std::any::TypeId;
use std::fmt;

/// Canonical metric name type used throughout the crate.
pub type MetricName = String;

/// Canonical producer name type used throughout the crate.
pub type ProducerName = String;

/// Identifier of a materialized artifact.
///
/// Every compute function must ultimately yield one of these; the string is
/// whatever the external compute engine uses to address the artifact (a view
/// name, a table name, a dataset key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArtifactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArtifactId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which metrics a run should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every registered metric, in registration order.
    All,
    /// A single metric by name.
    One(MetricName),
    /// An explicit list of metrics, run in the given order.
    Many(Vec<MetricName>),
}

impl Selection {
    /// Build a selection from a possibly-empty list of names (empty = all).
    pub fn from_names(mut names: Vec<MetricName>) -> Self {
        match names.len() {
            0 => Selection::All,
            1 => Selection::One(names.remove(0)),
            _ => Selection::Many(names),
        }
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Selection::One(name.to_string())
    }
}

/// Runtime identity of a Rust type, as captured at registration time.
///
/// Used for two things: looking up injected arguments in the container, and
/// checking that compute functions return an artifact identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeSpec {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}
