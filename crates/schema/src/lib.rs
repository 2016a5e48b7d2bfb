//! In-memory collaborators for NodeBuilder.
//!
//! - [`InMemorySchema`] — a [`SchemaProvider`](nodebuilder_core::SchemaProvider)
//!   over declared entity definitions and a row store
//! - [`StaticDirectives`] — a [`DirectiveProvider`](nodebuilder_core::DirectiveProvider)
//!   over a `(type, field)` table
//!
//! Both can be built from a [`NodeBuilderConfig`].

pub mod directives;
pub mod in_memory;

use std::sync::Arc;

use nodebuilder_config::{ConfigError, NodeBuilderConfig};
use nodebuilder_core::{EntityRegistry, MappingDirective, SchemaError, TransformRegistry};

pub use directives::StaticDirectives;
pub use in_memory::{EntityDefinition, InMemorySchema};

/// Build a schema from configuration, seeding each type's configured rows.
pub fn schema_from_config(
    config: &NodeBuilderConfig,
    registry: Arc<EntityRegistry>,
) -> Result<InMemorySchema, SchemaError> {
    let mut schema = InMemorySchema::new(registry);

    for entity in &config.entities {
        let mut definition = EntityDefinition::new(&entity.name)
            .fields(entity.fields.iter().cloned())
            .primary_key(entity.primary_key.iter().cloned());
        for assoc in &entity.associations {
            definition = definition.association(&assoc.name, &assoc.target, assoc.kind);
        }
        schema.define(definition);
    }

    for entity in &config.entities {
        for row in &entity.rows {
            schema.insert_row(&entity.name, row.clone())?;
        }
    }

    tracing::debug!(entities = config.entities.len(), "Built in-memory schema from config");
    Ok(schema)
}

/// Build the directive table from configuration, resolving middleware names.
pub fn directives_from_config(
    config: &NodeBuilderConfig,
    transforms: &TransformRegistry,
) -> Result<StaticDirectives, ConfigError> {
    let mut directives = StaticDirectives::new();

    for (entity_type, fields) in &config.directives {
        for (field, declared) in fields {
            let middleware = transforms.chain(&declared.middleware).map_err(|e| {
                ConfigError::ValidationError(format!("{entity_type}.{field}: {e}"))
            })?;
            directives.insert(
                entity_type,
                field,
                MappingDirective {
                    field_name: String::new(),
                    setter_override: declared.setter.clone(),
                    middleware,
                    strategy: declared.strategy,
                },
            );
        }
    }

    Ok(directives)
}

/// Build both providers from configuration.
pub fn providers_from_config(
    config: &NodeBuilderConfig,
    registry: Arc<EntityRegistry>,
    transforms: &TransformRegistry,
) -> nodebuilder_core::Result<(InMemorySchema, StaticDirectives)> {
    let schema = schema_from_config(config, registry)?;
    let directives = directives_from_config(config, transforms)?;
    Ok((schema, directives))
}
