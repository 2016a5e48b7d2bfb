//! Mapping instructions — the execution plan produced by the engine.
//!
//! One instruction per input key that matches a scalar field or an
//! association. Each carries the raw input value, its directive, and a bound
//! setter ready to write onto an entity.

use std::fmt;
use std::sync::Arc;

use crate::directive::MappingDirective;
use crate::entity::EntityInstance;
use crate::error::AssignmentError;
use crate::schema::Cardinality;
use crate::value::{Payload, Value};

/// A bound setter. Errors surface only when it is invoked.
pub type Setter =
    Arc<dyn Fn(&mut EntityInstance, Payload) -> Result<(), AssignmentError> + Send + Sync>;

/// A scalar assignment.
#[derive(Clone)]
pub struct FieldInstruction {
    pub value: Value,
    pub directive: MappingDirective,
    pub setter: Setter,
}

/// A relation assignment.
#[derive(Clone)]
pub struct RelationInstruction {
    pub value: Value,
    pub directive: MappingDirective,
    pub target_type: String,
    pub cardinality: Cardinality,
    pub setter: Setter,
}

#[derive(Clone)]
pub enum MappingInstruction {
    Field(FieldInstruction),
    Relation(RelationInstruction),
}

impl MappingInstruction {
    pub fn field_name(&self) -> &str {
        &self.directive().field_name
    }

    pub fn value(&self) -> &Value {
        match self {
            Self::Field(f) => &f.value,
            Self::Relation(r) => &r.value,
        }
    }

    pub fn directive(&self) -> &MappingDirective {
        match self {
            Self::Field(f) => &f.directive,
            Self::Relation(r) => &r.directive,
        }
    }

    pub fn setter(&self) -> &Setter {
        match self {
            Self::Field(f) => &f.setter,
            Self::Relation(r) => &r.setter,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation(_))
    }

    /// Invoke the bound setter on `entity`.
    pub fn apply(&self, entity: &mut EntityInstance, payload: Payload) -> Result<(), AssignmentError> {
        (self.setter())(entity, payload)
    }
}

impl fmt::Debug for FieldInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInstruction")
            .field("value", &self.value)
            .field("directive", &self.directive)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for RelationInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationInstruction")
            .field("value", &self.value)
            .field("directive", &self.directive)
            .field("target_type", &self.target_type)
            .field("cardinality", &self.cardinality)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for MappingInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(i) => fmt::Debug::fmt(i, f),
            Self::Relation(i) => fmt::Debug::fmt(i, f),
        }
    }
}
