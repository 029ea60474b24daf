use crate::cli::ModelArgs;
use crate::error::{CliError, Result};
use periodix::workflows::config::{ModelConfig, ModelConfigBuilder, PositionUnit};
use tracing::debug;

/// Merges the optional configuration file with command-line overrides.
///
/// Command-line values replace file values; `--property` entries are appended
/// after the file's `[[atom-property]]` entries.
pub fn build_model_config(args: &ModelArgs) -> Result<ModelConfig> {
    let file_config = match &args.config {
        Some(path) => {
            debug!("Loading model configuration from {:?}", path);
            ModelConfig::load(path)?
        }
        None => ModelConfig::default(),
    };

    let mut builder = ModelConfigBuilder::from(file_config);
    if let Some(symbols) = &args.symbols {
        builder = builder.symbols(symbols.iter().map(|s| s.trim()));
    }
    if let Some(unit) = &args.box_unit {
        builder = builder.box_unit(unit);
    }
    if let Some(unit) = &args.position_unit {
        builder = builder.position_unit(unit.parse::<PositionUnit>()?);
    }
    for property in &args.properties {
        let (name, unit) = parse_property(property)?;
        builder = builder.atom_property(name, unit);
    }

    Ok(builder.build()?)
}

/// Splits a `NAME[:UNIT]` argument.
fn parse_property(arg: &str) -> Result<(&str, Option<&str>)> {
    let (name, unit) = match arg.split_once(':') {
        Some((name, unit)) => (name.trim(), Some(unit.trim())),
        None => (arg.trim(), None),
    };
    if name.is_empty() {
        return Err(CliError::Argument(format!(
            "Property '{}' has an empty name; expected NAME[:UNIT]",
            arg
        )));
    }
    Ok((name, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CrystalArgs, PrototypeArg};
    use periodix::workflows::config::AtomPropertySpec;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn args(config: Option<PathBuf>) -> ModelArgs {
        ModelArgs {
            crystal: CrystalArgs {
                prototype: PrototypeArg::B2,
                a: 2.9,
                b: None,
                c: None,
                repeat: vec![1, 1, 1],
            },
            config,
            output: None,
            symbols: None,
            box_unit: None,
            position_unit: None,
            properties: Vec::new(),
        }
    }

    #[test]
    fn defaults_apply_without_file_or_overrides() {
        assert_eq!(build_model_config(&args(None)).unwrap(), ModelConfig::default());
    }

    #[test]
    fn command_line_overrides_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(
            &path,
            r#"
box-unit = "nm"
symbols = ["Fe", "Al"]

[[atom-property]]
name = "charge"
unit = "e"
"#,
        )
        .unwrap();

        let mut args = args(Some(path));
        args.symbols = Some(vec!["Co".to_string(), " Al ".to_string()]);
        args.position_unit = Some("angstrom".to_string());
        args.properties = vec!["spin".to_string()];

        let config = build_model_config(&args).unwrap();
        assert_eq!(config.box_unit, "nm");
        assert_eq!(
            config.symbols,
            Some(vec!["Co".to_string(), "Al".to_string()])
        );
        assert_eq!(
            config.position_unit,
            PositionUnit::Unit("angstrom".to_string())
        );
        assert_eq!(
            config.atom_properties,
            vec![
                AtomPropertySpec {
                    name: "charge".to_string(),
                    unit: Some("e".to_string()),
                },
                AtomPropertySpec {
                    name: "spin".to_string(),
                    unit: None,
                },
            ]
        );
    }

    #[test]
    fn missing_config_file_is_reported() {
        let dir = tempdir().unwrap();
        let result = build_model_config(&args(Some(dir.path().join("missing.toml"))));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn property_arguments_split_on_colon() {
        assert_eq!(parse_property("force:eV/angstrom").unwrap(), ("force", Some("eV/angstrom")));
        assert_eq!(parse_property("label").unwrap(), ("label", None));
        assert!(matches!(parse_property(":e"), Err(CliError::Argument(_))));
    }

    #[test]
    fn duplicate_property_is_rejected() {
        let mut args = args(None);
        args.properties = vec!["charge".to_string(), "charge:e".to_string()];
        assert!(matches!(build_model_config(&args), Err(CliError::Config(_))));
    }
}
