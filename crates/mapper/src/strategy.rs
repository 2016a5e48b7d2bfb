//! Assignment strategies — how a directive becomes a bound setter.
//!
//! Strategies only build setters; they never apply values themselves. Every
//! failure (missing method, missing or inaccessible field, bad value) is
//! raised when the setter is invoked.

use std::sync::Arc;

use nodebuilder_config::{MapperSettings, StrategyKind};
use nodebuilder_core::naming::setter_name;
use nodebuilder_core::{DirectiveStrategy, EntityInstance, MappingDirective, Payload, Setter};

/// Builds setters for directives.
pub trait AssignmentStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Produce the setter for `directive`.
    fn bind(&self, directive: &MappingDirective) -> Setter;

    /// Human-readable name of the member the setter writes through.
    fn describe(&self, directive: &MappingDirective) -> String;
}

/// Writes the field named by the directive, if it is public.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectStrategy;

impl AssignmentStrategy for DirectStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    fn bind(&self, directive: &MappingDirective) -> Setter {
        let field = directive.field_name.clone();
        Arc::new(move |entity: &mut EntityInstance, payload: Payload| entity.write_field(&field, payload))
    }

    fn describe(&self, directive: &MappingDirective) -> String {
        format!("field {}", directive.field_name)
    }
}

/// Calls a setter method: the directive's override, or `prefix + PascalCase(field)`.
#[derive(Debug, Clone)]
pub struct MethodStrategy {
    prefix: String,
}

impl MethodStrategy {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The method name a directive resolves to.
    pub fn method_name(&self, directive: &MappingDirective) -> String {
        directive
            .setter_override
            .clone()
            .unwrap_or_else(|| setter_name(&self.prefix, &directive.field_name))
    }
}

impl Default for MethodStrategy {
    fn default() -> Self {
        Self::new(nodebuilder_core::naming::DEFAULT_SETTER_PREFIX)
    }
}

impl AssignmentStrategy for MethodStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Method
    }

    fn bind(&self, directive: &MappingDirective) -> Setter {
        let method = self.method_name(directive);
        let field = directive.field_name.clone();
        let magic = directive.strategy == DirectiveStrategy::Magic;

        Arc::new(move |entity: &mut EntityInstance, payload: Payload| {
            if magic && !entity.binding().has_method(&method) {
                return entity.write_field(&field, payload);
            }
            entity.call_method(&method, payload)
        })
    }

    fn describe(&self, directive: &MappingDirective) -> String {
        let method = self.method_name(directive);
        match directive.strategy {
            DirectiveStrategy::Magic => format!("method {method} (or field {})", directive.field_name),
            DirectiveStrategy::Restrict => format!("method {method}"),
        }
    }
}

/// Writes the field under scoped privileged access, ignoring visibility.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflectionStrategy;

impl AssignmentStrategy for ReflectionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Reflection
    }

    fn bind(&self, directive: &MappingDirective) -> Setter {
        let field = directive.field_name.clone();
        Arc::new(move |entity: &mut EntityInstance, payload: Payload| {
            // The guard restores the previous access level when it drops.
            entity.elevate().write_field(&field, payload)
        })
    }

    fn describe(&self, directive: &MappingDirective) -> String {
        format!("field {} (privileged)", directive.field_name)
    }
}

/// The strategy selected by `settings`.
pub fn strategy_for(settings: &MapperSettings) -> Arc<dyn AssignmentStrategy> {
    match settings.strategy {
        StrategyKind::Direct => Arc::new(DirectStrategy),
        StrategyKind::Method => Arc::new(MethodStrategy::new(&settings.setter_prefix)),
        StrategyKind::Reflection => Arc::new(ReflectionStrategy),
    }
}
