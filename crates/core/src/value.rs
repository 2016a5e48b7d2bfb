//! Input data and setter payloads.

use crate::entity::EntityInstance;
use crate::error::Result;

/// Raw input value.
pub use serde_json::Value;

/// The associative input map applied onto an entity.
pub type Data = serde_json::Map<String, Value>;

/// Parse a JSON document that must be an object.
pub fn parse_data(raw: &str) -> Result<Data> {
    Ok(serde_json::from_str(raw)?)
}

/// What a bound setter receives.
///
/// Scalar fields get the (transformed) input value; relations get already
/// built entities.
#[derive(Debug)]
pub enum Payload {
    Value(Value),
    /// To-one relation; `None` clears it.
    Entity(Option<EntityInstance>),
    /// To-many relation.
    Entities(Vec<EntityInstance>),
}

impl Payload {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Entity(_) => "entity",
            Self::Entities(_) => "entities",
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<EntityInstance> for Payload {
    fn from(entity: EntityInstance) -> Self {
        Self::Entity(Some(entity))
    }
}

impl From<Vec<EntityInstance>> for Payload {
    fn from(entities: Vec<EntityInstance>) -> Self {
        Self::Entities(entities)
    }
}
