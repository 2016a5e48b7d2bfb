//! `nodebuilder resolve` — Print which resolution path input data takes.

use std::path::Path;
use std::sync::Arc;

use nodebuilder_config::NodeBuilderConfig;
use nodebuilder_core::{Data, EntityRegistry};
use nodebuilder_mapper::{EntityResolver, Resolution};

pub fn run(config: Option<&Path>, entity_type: &str, data: &str) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let data = super::read_data(data)?;
    println!("{entity_type}: {}", plan(&config, entity_type, &data)?);
    Ok(())
}

pub fn plan(config: &NodeBuilderConfig, entity_type: &str, data: &Data) -> anyhow::Result<Resolution> {
    let (schema, _) = super::inspection_providers(config)?;
    let resolver = EntityResolver::new(schema, Arc::new(EntityRegistry::new()));
    Ok(resolver.plan(entity_type, data)?)
}
