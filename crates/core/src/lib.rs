//! # NodeBuilder Core
//!
//! Domain types, collaborator traits, and error definitions for NodeBuilder,
//! the layer that maps associative input data onto ORM entities.
//!
//! ## Design Philosophy
//!
//! The two external collaborators are traits defined here:
//! - [`SchemaProvider`] reports fields, associations and primary keys, and
//!   fetches entities by key
//! - [`DirectiveProvider`] reports per-field mapping directives
//!
//! Implementations live in their respective crates. Entity types describe
//! themselves once, at startup, through an [`EntityBinding`], so the mapper
//! never needs runtime reflection.

pub mod directive;
pub mod entity;
pub mod error;
pub mod instruction;
pub mod naming;
pub mod schema;
pub mod transform;
pub mod value;

// Re-export key types at crate root for ergonomics
pub use directive::{DirectiveProvider, DirectiveStrategy, MappingDirective, NoDirectives};
pub use entity::{Access, ElevatedAccess, EntityBinding, EntityInstance, EntityRegistry, Visibility};
pub use error::{AssignmentError, Error, ResolveError, Result, SchemaError, TransformError};
pub use instruction::{FieldInstruction, MappingInstruction, RelationInstruction, Setter};
pub use schema::{AssociationInfo, AssociationKind, Cardinality, Criteria, SchemaProvider};
pub use transform::{Transform, TransformRegistry};
pub use value::{Data, Payload, Value};
