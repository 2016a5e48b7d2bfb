//! SchemaProvider trait — the mapper's view of ORM metadata.
//!
//! The provider reports, per entity type, its scalar fields, associations,
//! primary key, and can fetch an existing entity by primary-key criteria.
//! Names are returned in declaration order; the mapper preserves that order.

use serde::{Deserialize, Serialize};

use crate::entity::EntityInstance;
use crate::error::SchemaError;
use crate::value::Value;

/// Primary-key field name to supplied value.
pub type Criteria = serde_json::Map<String, Value>;

/// The declared kind of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl AssociationKind {
    pub fn cardinality(self) -> Cardinality {
        match self {
            Self::OneToMany | Self::ManyToMany => Cardinality::ToMany,
            Self::OneToOne | Self::ManyToOne => Cardinality::ToOne,
        }
    }
}

impl std::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OneToOne => "one_to_one",
            Self::ManyToOne => "many_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToMany => "many_to_many",
        };
        f.write_str(s)
    }
}

/// How many related entities a relation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToOne => f.write_str("to_one"),
            Self::ToMany => f.write_str("to_many"),
        }
    }
}

/// Metadata of a single association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationInfo {
    /// Entity type on the other side of the association
    pub target_type: String,

    /// Declared association kind
    pub kind: AssociationKind,
}

impl AssociationInfo {
    pub fn new(target_type: impl Into<String>, kind: AssociationKind) -> Self {
        Self {
            target_type: target_type.into(),
            kind,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }
}

/// The core SchemaProvider trait.
///
/// Every method fails with [`SchemaError::NotFound`] for an unknown entity type.
pub trait SchemaProvider: Send + Sync {
    /// Scalar (non-relational) field names, in declaration order.
    fn scalar_field_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError>;

    /// Association names, in declaration order.
    fn association_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError>;

    /// Target type and kind of one association.
    fn association_info(&self, entity_type: &str, name: &str) -> Result<AssociationInfo, SchemaError>;

    /// Primary-key field names, in key order.
    fn primary_key_field_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError>;

    /// Fetch an entity by its full primary key. `Ok(None)` means not found.
    fn find_by_criteria(
        &self,
        entity_type: &str,
        criteria: &Criteria,
    ) -> Result<Option<EntityInstance>, SchemaError>;
}
