//! `nodebuilder plan` — Print the mapping instructions for input data.

use std::fmt::Write;
use std::path::Path;

use nodebuilder_config::NodeBuilderConfig;
use nodebuilder_core::{Data, MappingInstruction};
use nodebuilder_mapper::MappingEngine;

pub fn run(config: Option<&Path>, entity_type: &str, data: &str) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let data = super::read_data(data)?;
    print!("{}", render(&config, entity_type, &data)?);
    Ok(())
}

pub fn render(config: &NodeBuilderConfig, entity_type: &str, data: &Data) -> anyhow::Result<String> {
    let settings = config.settings()?;
    let (schema, directives) = super::inspection_providers(config)?;
    let engine = MappingEngine::new(schema, directives, &settings);

    let plan = engine.compare_fields(entity_type, data)?;
    let skipped: Vec<&str> = data
        .keys()
        .filter(|key| !plan.iter().any(|i| i.field_name() == key.as_str()))
        .map(String::as_str)
        .collect();

    let mut out = String::new();
    writeln!(
        out,
        "{entity_type}: {} instruction(s), strategy {}",
        plan.len(),
        engine.strategy()
    )?;

    for (n, instruction) in plan.iter().enumerate() {
        let kind = if instruction.is_relation() { "relation" } else { "field" };
        write!(
            out,
            "  {}. {kind:<8} {:<16} -> {}",
            n + 1,
            instruction.field_name(),
            engine.describe_setter(instruction)
        )?;
        if let MappingInstruction::Relation(relation) = instruction {
            write!(out, "  ({}, {})", relation.target_type, relation.cardinality)?;
        }
        let middleware = instruction.directive().middleware_names();
        if !middleware.is_empty() {
            write!(out, "  [{}]", middleware.join(" | "))?;
        }
        writeln!(out)?;
    }

    if !skipped.is_empty() {
        writeln!(out, "  skipped: {}", skipped.join(", "))?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::invoice_config;
    use serde_json::json;

    fn data(value: serde_json::Value) -> Data {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn lists_instructions_in_plan_order() {
        let out = render(
            &invoice_config(),
            "Invoice",
            &data(json!({"customer": {"id": 1}, "extra": 99, "total": "42", "id": 7})),
        )
        .unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Invoice: 3 instruction(s), strategy method");
        assert!(lines[1].contains("field") && lines[1].contains("id") && lines[1].ends_with("method setId"));
        assert!(lines[2].contains("method applyTotal") && lines[2].ends_with("[trim | to_number]"));
        assert!(lines[3].contains("relation") && lines[3].ends_with("(Customer, to_one)"));
        assert_eq!(lines[4], "  skipped: extra");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = render(&invoice_config(), "Ghost", &Data::new()).unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }
}
