//! `nodebuilder check` — Validate the configuration and print a summary.

use std::fmt::Write;
use std::path::Path;

use nodebuilder_config::NodeBuilderConfig;

pub fn run(config: Option<&Path>) -> anyhow::Result<()> {
    println!("🔍 Validating configuration...");

    let config = match super::load_config(config) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e:#}");
            return Err(e);
        }
    };

    match summarize(&config) {
        Ok(summary) => {
            println!("   ✅ Config parsed successfully\n");
            print!("{summary}");
            Ok(())
        }
        Err(e) => {
            println!("   ❌ Config error: {e:#}");
            Err(e)
        }
    }
}

/// Checks that go beyond parsing, then a per-entity summary.
pub fn summarize(config: &NodeBuilderConfig) -> anyhow::Result<String> {
    let settings = config.settings()?;
    let (_, directives) = super::inspection_providers(config)?;

    let mut out = String::new();
    writeln!(out, "   Strategy:    {}", settings.strategy)?;
    writeln!(out, "   Prefix:      {}", settings.setter_prefix)?;
    writeln!(out, "   Max depth:   {}", settings.max_depth)?;
    writeln!(out, "   Directives:  {}", directives.len())?;
    writeln!(out, "   Entities:    {}", config.entities.len())?;

    for entity in &config.entities {
        writeln!(
            out,
            "     - {} (key: {}; fields: {}; associations: {}; rows: {})",
            entity.name,
            entity.primary_key.join(", "),
            entity.fields.len(),
            entity.associations.len(),
            entity.rows.len()
        )?;
    }

    Ok(out)
}
