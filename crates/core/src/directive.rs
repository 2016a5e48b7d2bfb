//! Mapping directives — per-field configuration of how a value is applied.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Whether a field may be written through implicit members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveStrategy {
    /// Only the declared setter method may be used.
    #[default]
    Restrict,
    /// A missing setter method falls back to a public field write.
    Magic,
}

/// Per-field configuration consumed by the assignment strategies.
#[derive(Clone, Default)]
pub struct MappingDirective {
    /// The schema field this directive applies to. Set by the engine.
    pub field_name: String,

    /// Explicit setter method name; derived from `field_name` when absent.
    pub setter_override: Option<String>,

    /// Value transforms, applied in order.
    pub middleware: Vec<Arc<dyn Transform>>,

    pub strategy: DirectiveStrategy,
}

impl MappingDirective {
    pub fn with_setter(mut self, setter: impl Into<String>) -> Self {
        self.setter_override = Some(setter.into());
        self
    }

    pub fn with_middleware(mut self, transform: Arc<dyn Transform>) -> Self {
        self.middleware.push(transform);
        self
    }

    pub fn with_strategy(mut self, strategy: DirectiveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Names of the middleware chain, in order.
    pub fn middleware_names(&self) -> Vec<&str> {
        self.middleware.iter().map(|t| t.name()).collect()
    }
}

impl fmt::Debug for MappingDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingDirective")
            .field("field_name", &self.field_name)
            .field("setter_override", &self.setter_override)
            .field("middleware", &self.middleware_names())
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Supplies directives for entity fields.
pub trait DirectiveProvider: Send + Sync {
    /// The directive declared for `field` of `entity_type`, if any.
    fn directive(&self, entity_type: &str, field: &str) -> Option<MappingDirective>;
}

/// A provider that never declares anything; every field gets the default directive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDirectives;

impl DirectiveProvider for NoDirectives {
    fn directive(&self, _entity_type: &str, _field: &str) -> Option<MappingDirective> {
        None
    }
}
