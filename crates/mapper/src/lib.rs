//! The NodeBuilder mapping layer.
//!
//! - [`MappingEngine`] turns `(entity type, input data)` into ordered
//!   [`MappingInstruction`](nodebuilder_core::MappingInstruction)s
//! - [`AssignmentStrategy`] implementations bind each instruction's setter
//! - [`EntityResolver`] picks the instance the data is applied to
//! - [`NodeBuilder`] composes the three, building nested relations recursively

pub mod builder;
pub mod engine;
pub mod resolver;
pub mod strategy;

pub use builder::{BuildError, NodeBuilder};
pub use engine::MappingEngine;
pub use resolver::{EntityResolver, Factory, Resolution};
pub use strategy::{
    AssignmentStrategy, DirectStrategy, MethodStrategy, ReflectionStrategy, strategy_for,
};

pub use nodebuilder_config::{MapperSettings, StrategyKind};
