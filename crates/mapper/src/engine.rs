//! Mapping engine — reconciles schema metadata and field directives into an
//! ordered list of mapping instructions.
//!
//! For an entity type and an input map, the engine emits one instruction per
//! input key that names a scalar field or an association of the type. Scalar
//! field instructions come first, then relation instructions; each group
//! follows the schema's declaration order. Keys the schema does not know are
//! skipped silently.

use std::sync::Arc;

use nodebuilder_config::{MapperSettings, StrategyKind};
use nodebuilder_core::error::SchemaError;
use nodebuilder_core::{
    Data, DirectiveProvider, FieldInstruction, MappingDirective, MappingInstruction,
    RelationInstruction, SchemaProvider,
};

use crate::strategy::{AssignmentStrategy, strategy_for};

pub struct MappingEngine {
    schema: Arc<dyn SchemaProvider>,
    directives: Arc<dyn DirectiveProvider>,
    strategy: Arc<dyn AssignmentStrategy>,
}

impl MappingEngine {
    /// Create an engine using the strategy selected by `settings`.
    pub fn new(
        schema: Arc<dyn SchemaProvider>,
        directives: Arc<dyn DirectiveProvider>,
        settings: &MapperSettings,
    ) -> Self {
        Self::with_strategy(schema, directives, strategy_for(settings))
    }

    /// Create an engine with an explicit strategy instance.
    pub fn with_strategy(
        schema: Arc<dyn SchemaProvider>,
        directives: Arc<dyn DirectiveProvider>,
        strategy: Arc<dyn AssignmentStrategy>,
    ) -> Self {
        Self {
            schema,
            directives,
            strategy,
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn schema(&self) -> &Arc<dyn SchemaProvider> {
        &self.schema
    }

    /// Describe what an instruction's setter writes through.
    pub fn describe_setter(&self, instruction: &MappingInstruction) -> String {
        self.strategy.describe(instruction.directive())
    }

    /// Build the instructions for mapping `data` onto an `entity_type`.
    pub fn compare_fields(
        &self,
        entity_type: &str,
        data: &Data,
    ) -> Result<Vec<MappingInstruction>, SchemaError> {
        let fields = self.schema.scalar_field_names(entity_type)?;
        let associations = self.schema.association_names(entity_type)?;

        let mut plan = Vec::new();

        for field in fields {
            let Some(value) = data.get(&field) else {
                continue;
            };
            let directive = self.directive_for(entity_type, &field);
            let setter = self.strategy.bind(&directive);
            plan.push(MappingInstruction::Field(FieldInstruction {
                value: value.clone(),
                directive,
                setter,
            }));
        }

        for name in associations {
            let Some(value) = data.get(&name) else {
                continue;
            };
            let directive = self.directive_for(entity_type, &name);
            let setter = self.strategy.bind(&directive);
            let info = self.schema.association_info(entity_type, &name)?;
            plan.push(MappingInstruction::Relation(RelationInstruction {
                value: value.clone(),
                directive,
                target_type: info.target_type.clone(),
                cardinality: info.cardinality(),
                setter,
            }));
        }

        tracing::debug!(
            entity_type,
            strategy = %self.strategy.kind(),
            keys = data.len(),
            instructions = plan.len(),
            "Compiled mapping plan"
        );

        Ok(plan)
    }

    fn directive_for(&self, entity_type: &str, field: &str) -> MappingDirective {
        let mut directive = self
            .directives
            .directive(entity_type, field)
            .unwrap_or_default();
        directive.field_name = field.to_string();
        tracing::trace!(entity_type, field, setter = ?directive.setter_override, "Resolved directive");
        directive
    }
}
