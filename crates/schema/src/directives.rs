//! Static directive table — a [`DirectiveProvider`] backed by a map.

use std::collections::HashMap;

use nodebuilder_core::{DirectiveProvider, MappingDirective};

/// Directives keyed by `(entity type, field)`.
#[derive(Debug, Default, Clone)]
pub struct StaticDirectives {
    directives: HashMap<(String, String), MappingDirective>,
}

impl StaticDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a directive. Replaces any existing directive for the same field.
    pub fn insert(&mut self, entity_type: &str, field: &str, directive: MappingDirective) {
        self.directives
            .insert((entity_type.to_string(), field.to_string()), directive);
    }

    pub fn with(mut self, entity_type: &str, field: &str, directive: MappingDirective) -> Self {
        self.insert(entity_type, field, directive);
        self
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl DirectiveProvider for StaticDirectives {
    fn directive(&self, entity_type: &str, field: &str) -> Option<MappingDirective> {
        self.directives
            .get(&(entity_type.to_string(), field.to_string()))
            .cloned()
    }
}
