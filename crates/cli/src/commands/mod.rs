pub mod check;
pub mod plan;
pub mod resolve;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use nodebuilder_config::NodeBuilderConfig;
use nodebuilder_core::value::parse_data as parse_data_str;
use nodebuilder_core::{Data, EntityRegistry, TransformRegistry};
use nodebuilder_schema::{InMemorySchema, StaticDirectives, providers_from_config};

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<NodeBuilderConfig> {
    let Some(path) = path else {
        return Ok(NodeBuilderConfig::load()?);
    };

    if !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    let mut config = NodeBuilderConfig::load_from(path)?;
    config.apply_env_overrides()?;
    Ok(config)
}

/// Parse input data given inline, as a file path, or `-` for stdin.
pub fn read_data(arg: &str) -> anyhow::Result<Data> {
    let raw = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read input data from stdin")?;
        buf
    } else if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).with_context(|| format!("failed to read input data from {arg}"))?
    };

    parse_data(&raw)
}

fn parse_data(raw: &str) -> anyhow::Result<Data> {
    parse_data_str(raw).context("input data must be a JSON object")
}

/// The configured providers. Inspection commands never construct entities, so
/// no bindings are registered.
pub fn inspection_providers(
    config: &NodeBuilderConfig,
) -> anyhow::Result<(Arc<InMemorySchema>, Arc<StaticDirectives>)> {
    let (schema, directives) = providers_from_config(
        config,
        Arc::new(EntityRegistry::new()),
        &TransformRegistry::with_builtins(),
    )?;
    Ok((Arc::new(schema), Arc::new(directives)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const INVOICE_TOML: &str = r#"
[mapper]
strategy = "method"

[[entities]]
name = "Customer"
fields = ["id", "name"]
primary_key = ["id"]

[[entities]]
name = "Invoice"
fields = ["id", "total"]
primary_key = ["id"]
associations = [{ name = "customer", target = "Customer", kind = "many_to_one" }]

[directives.Invoice.total]
setter = "applyTotal"
middleware = ["trim", "to_number"]
"#;

    pub(crate) fn invoice_config() -> NodeBuilderConfig {
        NodeBuilderConfig::from_toml(INVOICE_TOML).unwrap()
    }

    #[test]
    fn inline_json_is_parsed() {
        let data = read_data(r#"{"id": 7}"#).unwrap();
        assert_eq!(data.get("id"), Some(&serde_json::json!(7)));
    }

    #[test]
    fn json_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"total": 42}}"#).unwrap();
        let data = read_data(file.path().to_str().unwrap()).unwrap();
        assert_eq!(data.get("total"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn non_object_data_is_rejected() {
        let err = parse_data("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("JSON object"));
        assert!(format!("{err:#}").contains("Serialization error"));
        assert!(parse_data("{not json").is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn explicit_config_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INVOICE_TOML.as_bytes()).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.entities.len(), 2);
    }
}
