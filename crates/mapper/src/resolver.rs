//! Entity resolver — decides which instance input data is mapped onto.
//!
//! Resolution policy, in order:
//! 1. every primary-key field is present in the data: fetch by key
//! 2. a factory is configured: ask the factory
//! 3. otherwise: construct a bare instance through the entity registry

use std::fmt;
use std::sync::Arc;

use nodebuilder_core::schema::Criteria;
use nodebuilder_core::{Data, EntityInstance, EntityRegistry, ResolveError, SchemaProvider};

/// Produces a fresh instance for an entity type.
pub type Factory = Arc<dyn Fn(&str) -> Option<EntityInstance> + Send + Sync>;

/// Which path [`EntityResolver::resolve`] takes for given data.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Fetch by the complete primary key.
    Lookup(Criteria),
    /// Call the configured factory.
    Factory,
    /// Construct a bare instance.
    Construct,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup(criteria) => {
                write!(f, "lookup by {}", serde_json::Value::Object(criteria.clone()))
            }
            Self::Factory => f.write_str("factory"),
            Self::Construct => f.write_str("construct"),
        }
    }
}

pub struct EntityResolver {
    schema: Arc<dyn SchemaProvider>,
    registry: Arc<EntityRegistry>,
    factory: Option<Factory>,
}

impl EntityResolver {
    pub fn new(schema: Arc<dyn SchemaProvider>, registry: Arc<EntityRegistry>) -> Self {
        Self {
            schema,
            registry,
            factory: None,
        }
    }

    /// Use `factory` whenever the data does not carry a complete primary key.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Option<EntityInstance> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Decide how `data` resolves, without fetching or constructing anything.
    pub fn plan(&self, entity_type: &str, data: &Data) -> Result<Resolution, ResolveError> {
        let key_fields = self.schema.primary_key_field_names(entity_type)?;

        let criteria: Criteria = key_fields
            .iter()
            .filter_map(|field| data.get(field).map(|value| (field.clone(), value.clone())))
            .collect();

        // A partial key never triggers a fetch.
        if criteria.len() == key_fields.len() {
            return Ok(Resolution::Lookup(criteria));
        }

        if self.factory.is_some() {
            Ok(Resolution::Factory)
        } else {
            Ok(Resolution::Construct)
        }
    }

    /// Obtain the instance `data` should be mapped onto.
    ///
    /// `Ok(None)` means the key lookup (or the factory) found nothing; the
    /// caller decides what that means.
    pub fn resolve(&self, entity_type: &str, data: &Data) -> Result<Option<EntityInstance>, ResolveError> {
        let resolution = self.plan(entity_type, data)?;
        tracing::debug!(entity_type, resolution = %resolution, "Resolving entity");

        match resolution {
            Resolution::Lookup(criteria) => Ok(self.schema.find_by_criteria(entity_type, &criteria)?),
            Resolution::Factory => Ok(self.factory.as_ref().and_then(|factory| factory(entity_type))),
            Resolution::Construct => self.registry.construct(entity_type).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodebuilder_core::error::SchemaError;
    use nodebuilder_core::schema::AssociationInfo;
    use nodebuilder_core::EntityBinding;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Order {
        origin: &'static str,
    }

    /// Records every lookup; finds an order only for `{"id": 7}`-style keys.
    struct RecordingSchema {
        key: Vec<String>,
        lookups: Mutex<Vec<Criteria>>,
        registry: Arc<EntityRegistry>,
    }

    impl SchemaProvider for RecordingSchema {
        fn scalar_field_names(&self, _: &str) -> Result<Vec<String>, SchemaError> {
            Ok(self.key.clone())
        }

        fn association_names(&self, _: &str) -> Result<Vec<String>, SchemaError> {
            Ok(vec![])
        }

        fn association_info(&self, t: &str, n: &str) -> Result<AssociationInfo, SchemaError> {
            Err(SchemaError::UnknownAssociation {
                entity_type: t.into(),
                name: n.into(),
            })
        }

        fn primary_key_field_names(&self, entity_type: &str) -> Result<Vec<String>, SchemaError> {
            if entity_type == "Order" {
                Ok(self.key.clone())
            } else {
                Err(SchemaError::NotFound(entity_type.into()))
            }
        }

        fn find_by_criteria(
            &self,
            _: &str,
            criteria: &Criteria,
        ) -> Result<Option<EntityInstance>, SchemaError> {
            self.lookups.lock().unwrap().push(criteria.clone());
            if criteria.get("id") == Some(&json!(7)) {
                let found = self.registry.wrap("Order", Order { origin: "lookup" }).unwrap();
                Ok(Some(found))
            } else {
                Ok(None)
            }
        }
    }

    fn fixture(key: &[&str]) -> (Arc<RecordingSchema>, Arc<EntityRegistry>) {
        let mut registry = EntityRegistry::new();
        registry.register(
            EntityBinding::builder::<Order>("Order")
                .constructor(|| Order { origin: "construct" })
                .build(),
        );
        let registry = Arc::new(registry);
        let schema = Arc::new(RecordingSchema {
            key: key.iter().map(|s| s.to_string()).collect(),
            lookups: Mutex::new(Vec::new()),
            registry: Arc::clone(&registry),
        });
        (schema, registry)
    }

    fn data(value: serde_json::Value) -> Data {
        value.as_object().cloned().unwrap()
    }

    fn origin(entity: &EntityInstance) -> &'static str {
        entity.downcast_ref::<Order>().unwrap().origin
    }

    #[test]
    fn complete_key_triggers_lookup() {
        let (schema, registry) = fixture(&["id"]);
        let resolver = EntityResolver::new(schema.clone(), registry);

        let found = resolver.resolve("Order", &data(json!({"id": 7, "total": 1}))).unwrap().unwrap();
        assert_eq!(origin(&found), "lookup");

        let lookups = schema.lookups.lock().unwrap();
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0], data(json!({"id": 7})));
    }

    #[test]
    fn lookup_miss_is_not_an_error() {
        let (schema, registry) = fixture(&["id"]);
        let resolver = EntityResolver::new(schema, registry)
            .with_factory(|_| panic!("factory must not run when the key is complete"));
        assert!(resolver.resolve("Order", &data(json!({"id": 8}))).unwrap().is_none());
    }

    #[test]
    fn partial_composite_key_never_fetches() {
        let (schema, registry) = fixture(&["region", "number"]);
        let resolver = EntityResolver::new(schema.clone(), registry);

        let plan = resolver.plan("Order", &data(json!({"region": "eu"}))).unwrap();
        assert_eq!(plan, Resolution::Construct);

        let built = resolver.resolve("Order", &data(json!({"region": "eu"}))).unwrap().unwrap();
        assert_eq!(origin(&built), "construct");
        assert!(schema.lookups.lock().unwrap().is_empty());
    }

    #[test]
    fn composite_key_criteria_holds_only_key_fields() {
        let (schema, registry) = fixture(&["region", "number"]);
        let resolver = EntityResolver::new(schema, registry);
        let plan = resolver
            .plan("Order", &data(json!({"number": 3, "region": "eu", "x": 1})))
            .unwrap();
        assert_eq!(plan, Resolution::Lookup(data(json!({"region": "eu", "number": 3}))));
    }

    #[test]
    fn missing_key_uses_factory() {
        let (schema, registry) = fixture(&["id"]);
        let factory_registry = Arc::clone(&registry);
        let resolver = EntityResolver::new(schema, registry).with_factory(move |entity_type| {
            factory_registry.wrap(entity_type, Order { origin: "factory" }).ok()
        });

        assert!(resolver.has_factory());
        let built = resolver.resolve("Order", &data(json!({"total": 1}))).unwrap().unwrap();
        assert_eq!(origin(&built), "factory");
    }

    #[test]
    fn missing_key_without_factory_constructs() {
        let (schema, registry) = fixture(&["id"]);
        let resolver = EntityResolver::new(schema, registry);
        let built = resolver.resolve("Order", &Data::new()).unwrap().unwrap();
        assert_eq!(origin(&built), "construct");
    }

    #[test]
    fn unconstructible_type_is_an_error() {
        let (schema, _) = fixture(&["id"]);
        let resolver = EntityResolver::new(schema, Arc::new(EntityRegistry::new()));
        let err = resolver.resolve("Order", &Data::new()).unwrap_err();
        assert_eq!(err, ResolveError::NotConstructible("Order".into()));
    }

    #[test]
    fn unknown_type_propagates_schema_error() {
        let (schema, registry) = fixture(&["id"]);
        let resolver = EntityResolver::new(schema, registry);
        let err = resolver.resolve("Ghost", &Data::new()).unwrap_err();
        assert_eq!(err, ResolveError::Schema(SchemaError::NotFound("Ghost".into())));
    }

    #[test]
    fn resolution_display() {
        assert_eq!(Resolution::Construct.to_string(), "construct");
        let lookup = Resolution::Lookup(data(json!({"id": 7})));
        assert_eq!(lookup.to_string(), r#"lookup by {"id":7}"#);
    }
}
