//! NodeBuilder — applies input data onto resolved entities, recursively.
//!
//! Composes the [`EntityResolver`] (which instance?) with the
//! [`MappingEngine`] (which setters, with which values?). Relation values are
//! themselves input maps, built into entities before the parent's setter runs.

use std::sync::Arc;

use nodebuilder_config::MapperSettings;
use nodebuilder_core::error::{AssignmentError, ResolveError, SchemaError, TransformError};
use nodebuilder_core::transform::apply_chain;
use nodebuilder_core::{
    Cardinality, Data, DirectiveProvider, EntityInstance, EntityRegistry, MappingInstruction,
    Payload, RelationInstruction, SchemaProvider, Value,
};

use crate::engine::MappingEngine;
use crate::resolver::EntityResolver;

/// Errors from building entity graphs.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Middleware failed on {entity_type}.{field}: {source}")]
    Transform {
        entity_type: String,
        field: String,
        #[source]
        source: TransformError,
    },

    #[error("Failed to assign {entity_type}.{field}: {source}")]
    Assignment {
        entity_type: String,
        field: String,
        #[source]
        source: AssignmentError,
    },

    #[error("Relation {entity_type}.{field} expects {expected}")]
    InvalidRelationValue {
        entity_type: String,
        field: String,
        expected: &'static str,
    },

    #[error("Related {target_type} for {entity_type}.{field} could not be resolved")]
    Unresolved {
        entity_type: String,
        field: String,
        target_type: String,
    },

    #[error("Entity graph is nested deeper than {0} levels")]
    DepthExceeded(usize),
}

pub struct NodeBuilder {
    engine: MappingEngine,
    resolver: EntityResolver,
    max_depth: usize,
}

impl NodeBuilder {
    /// Wire an engine and a resolver over the same schema.
    pub fn new(
        schema: Arc<dyn SchemaProvider>,
        directives: Arc<dyn DirectiveProvider>,
        registry: Arc<EntityRegistry>,
        settings: &MapperSettings,
    ) -> Self {
        Self {
            engine: MappingEngine::new(Arc::clone(&schema), directives, settings),
            resolver: EntityResolver::new(schema, registry),
            max_depth: settings.max_depth,
        }
    }

    pub fn from_parts(engine: MappingEngine, resolver: EntityResolver, max_depth: usize) -> Self {
        Self {
            engine,
            resolver,
            max_depth,
        }
    }

    pub fn engine(&self) -> &MappingEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    /// Resolve an `entity_type` instance for `data` and map `data` onto it.
    ///
    /// `Ok(None)` when resolution found nothing (e.g. an unknown primary key).
    pub fn build(&self, entity_type: &str, data: &Data) -> Result<Option<EntityInstance>, BuildError> {
        self.build_at(entity_type, data, 0)
    }

    /// Map `data` onto an existing instance.
    pub fn apply(&self, entity: &mut EntityInstance, data: &Data) -> Result<(), BuildError> {
        self.apply_at(entity, data, 0)
    }

    fn build_at(
        &self,
        entity_type: &str,
        data: &Data,
        depth: usize,
    ) -> Result<Option<EntityInstance>, BuildError> {
        if depth > self.max_depth {
            return Err(BuildError::DepthExceeded(self.max_depth));
        }

        let Some(mut entity) = self.resolver.resolve(entity_type, data)? else {
            return Ok(None);
        };
        self.apply_at(&mut entity, data, depth)?;
        Ok(Some(entity))
    }

    fn apply_at(&self, entity: &mut EntityInstance, data: &Data, depth: usize) -> Result<(), BuildError> {
        let entity_type = entity.type_name().to_string();
        let plan = self.engine.compare_fields(&entity_type, data)?;

        for instruction in &plan {
            let field = instruction.field_name();
            let value = apply_chain(&instruction.directive().middleware, instruction.value().clone())
                .map_err(|source| BuildError::Transform {
                    entity_type: entity_type.clone(),
                    field: field.to_string(),
                    source,
                })?;

            let payload = match instruction {
                MappingInstruction::Field(_) => Payload::Value(value),
                MappingInstruction::Relation(relation) => {
                    self.relation_payload(&entity_type, relation, value, depth + 1)?
                }
            };

            instruction
                .apply(entity, payload)
                .map_err(|source| BuildError::Assignment {
                    entity_type: entity_type.clone(),
                    field: field.to_string(),
                    source,
                })?;
        }

        Ok(())
    }

    fn relation_payload(
        &self,
        entity_type: &str,
        relation: &RelationInstruction,
        value: Value,
        depth: usize,
    ) -> Result<Payload, BuildError> {
        let field = &relation.directive.field_name;
        let invalid = |expected| BuildError::InvalidRelationValue {
            entity_type: entity_type.to_string(),
            field: field.clone(),
            expected,
        };

        match (relation.cardinality, value) {
            (Cardinality::ToOne, Value::Null) => Ok(Payload::Entity(None)),
            (Cardinality::ToOne, Value::Object(data)) => {
                let related = self.build_related(entity_type, relation, &data, depth)?;
                Ok(Payload::Entity(Some(related)))
            }
            (Cardinality::ToOne, _) => Err(invalid("an object or null")),
            (Cardinality::ToMany, Value::Null) => Ok(Payload::Entities(Vec::new())),
            (Cardinality::ToMany, Value::Array(items)) => {
                let mut related = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Object(data) = item else {
                        return Err(invalid("an array of objects"));
                    };
                    related.push(self.build_related(entity_type, relation, &data, depth)?);
                }
                Ok(Payload::Entities(related))
            }
            (Cardinality::ToMany, _) => Err(invalid("an array of objects or null")),
        }
    }

    fn build_related(
        &self,
        entity_type: &str,
        relation: &RelationInstruction,
        data: &Data,
        depth: usize,
    ) -> Result<EntityInstance, BuildError> {
        self.build_at(&relation.target_type, data, depth)?
            .ok_or_else(|| BuildError::Unresolved {
                entity_type: entity_type.to_string(),
                field: relation.directive.field_name.clone(),
                target_type: relation.target_type.clone(),
            })
    }
}
