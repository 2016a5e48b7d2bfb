//! In-memory schema — useful for testing and for applications whose entity
//! metadata is declared in configuration rather than read from an ORM.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use nodebuilder_core::error::SchemaError;
use nodebuilder_core::schema::{AssociationInfo, AssociationKind, Criteria, SchemaProvider};
use nodebuilder_core::{Data, EntityInstance, EntityRegistry, Payload};

/// Metadata of one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDefinition {
    pub name: String,
    pub fields: Vec<String>,
    pub primary_key: Vec<String>,
    pub associations: Vec<(String, AssociationInfo)>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            primary_key: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn primary_key<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = key.into_iter().map(Into::into).collect();
        self
    }

    pub fn association(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        kind: AssociationKind,
    ) -> Self {
        self.associations
            .push((name.into(), AssociationInfo::new(target, kind)));
        self
    }
}

/// A [`SchemaProvider`] over a fixed set of definitions and a row store.
///
/// `find_by_criteria` scans the stored rows of a type for one whose values
/// equal every criterion, then materializes it through the entity registry.
#[derive(Debug)]
pub struct InMemorySchema {
    definitions: HashMap<String, EntityDefinition>,
    registry: Arc<EntityRegistry>,
    rows: RwLock<HashMap<String, Vec<Data>>>,
}

impl InMemorySchema {
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self {
            definitions: HashMap::new(),
            registry,
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Add (or replace) an entity definition.
    pub fn define(&mut self, definition: EntityDefinition) {
        self.definitions
            .insert(definition.name.clone(), definition);
    }

    pub fn with_definition(mut self, definition: EntityDefinition) -> Self {
        self.define(definition);
        self
    }

    pub fn definition(&self, entity_type: &str) -> Result<&EntityDefinition, SchemaError> {
        self.definitions
            .get(entity_type)
            .ok_or_else(|| SchemaError::NotFound(entity_type.to_string()))
    }

    /// Defined entity names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    /// Store a row for later lookup.
    pub fn insert_row(&self, entity_type: &str, row: Data) -> Result<(), SchemaError> {
        self.definition(entity_type)?;
        self.rows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(entity_type.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    pub fn row_count(&self, entity_type: &str) -> usize {
        self.rows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(entity_type)
            .map_or(0, Vec::len)
    }

    fn materialize(&self, definition: &EntityDefinition, row: &Data) -> Result<EntityInstance, SchemaError> {
        let mut entity = self
            .registry
            .construct(&definition.name)
            .map_err(|e| SchemaError::Lookup(e.to_string()))?;

        {
            // Stored rows bypass setters, as an ORM hydrating from the database would.
            let mut access = entity.elevate();
            for field in &definition.fields {
                if let Some(value) = row.get(field) {
                    access
                        .write_field(field, Payload::Value(value.clone()))
                        .map_err(|e| SchemaError::Lookup(e.to_string()))?;
                }
            }
        }

        Ok(entity)
    }
}

impl SchemaProvider for InMemorySchema {
    fn scalar_field_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self.definition(entity_type)?.fields.clone())
    }

    fn association_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self
            .definition(entity_type)?
            .associations
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn association_info(&self, entity_type: &str, name: &str) -> Result<AssociationInfo, SchemaError> {
        self.definition(entity_type)?
            .associations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, info)| info.clone())
            .ok_or_else(|| SchemaError::UnknownAssociation {
                entity_type: entity_type.to_string(),
                name: name.to_string(),
            })
    }

    fn primary_key_field_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self.definition(entity_type)?.primary_key.clone())
    }

    fn find_by_criteria(
        &self,
        entity_type: &str,
        criteria: &Criteria,
    ) -> Result<Option<EntityInstance>, SchemaError> {
        let definition = self.definition(entity_type)?;
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());

        let found = rows.get(entity_type).and_then(|rows| {
            rows.iter()
                .find(|row| criteria.iter().all(|(k, v)| row.get(k) == Some(v)))
        });

        tracing::debug!(entity_type, found = found.is_some(), "find_by_criteria");

        found
            .map(|row| self.materialize(definition, row))
            .transpose()
    }
}
