//! Command implementations.

use std::path::Path;

use formrender_config::{ConfigLoader, EngineConfig};
use formrender_fields::{Fields, Schema, ValidationReport, Validator};
use serde_json::Value;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Load engine settings, layering `path` when given.
pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    Ok(loader.load()?)
}

/// Build the form for a schema file and mount every field.
pub async fn open_form(schema: &Path, config: EngineConfig) -> CliResult<Fields> {
    let schema = Schema::load(schema).await?;
    let fields = Fields::builder(schema).config(config).build()?;
    for item in fields.items() {
        if let Some(context) = fields.get_field_context(item.path()) {
            context.register(|_| {});
        }
    }
    fields.mount();
    debug!(fields = fields.len(), "form mounted");
    Ok(fields)
}

/// Read a nested values object from a JSON or YAML file.
pub async fn read_values(path: &Path) -> CliResult<Value> {
    let display = path.display().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::ReadValues {
            path: display.clone(),
            source,
        })?;
    let invalid = |message: String| CliError::InvalidValues {
        path: display.clone(),
        message,
    };

    let values: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml_ng::from_str(&content).map_err(|e| invalid(e.to_string()))?
        }
        _ => serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?,
    };
    if !values.is_object() {
        return Err(invalid("expected an object at the top level".to_string()));
    }
    Ok(values)
}

async fn apply_values(fields: &Fields, values: Option<&Path>) -> CliResult<()> {
    if let Some(path) = values {
        fields.set_values(&read_values(path).await?);
    }
    fields.settle().await;
    Ok(())
}

/// `formrender values`: the values of every field after applying `values`.
pub async fn run_values(
    schema: &Path,
    values: Option<&Path>,
    config: EngineConfig,
) -> CliResult<Value> {
    let fields = open_form(schema, config).await?;
    apply_values(&fields, values).await?;
    let result = fields.get_values();
    fields.unmount();
    Ok(result)
}

/// `formrender validate`: the validation report after applying `values`.
pub async fn run_validate(
    schema: &Path,
    values: &Path,
    config: EngineConfig,
) -> CliResult<ValidationReport> {
    let fields = open_form(schema, config).await?;
    apply_values(&fields, Some(values)).await?;
    let report = fields.validate_all().await;
    fields.unmount();
    Ok(report)
}

/// Human or JSON rendering of a validation report.
pub fn render_report(report: &ValidationReport, json: bool) -> CliResult<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    if !Validator::has_errors(report) {
        return Ok(format!("All {} validated field(s) passed", report.len()));
    }
    let lines: Vec<String> = report
        .iter()
        .filter(|(_, result)| !result.is_valid)
        .map(|(name, result)| {
            format!(
                "{}: {}",
                name,
                result.error_message.as_deref().unwrap_or("invalid")
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formrender_config::FetchBackend;
    use formrender_fields::ValidationResult;
    use serde_json::json;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
title: Signup
fields:
  - fieldName: name
    control:
      type: input
      rules:
        - required: true
          message: name is required
  - fieldName: plan
    control:
      type: select
    model:
      defaultValue: basic
  - fieldName: address
    control:
      type: group
    children:
      - fieldName: city
        control:
          type: input
"#;

    fn offline() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.http.backend = FetchBackend::Disabled;
        config
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn values_command_applies_values_file() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "form.yaml", SCHEMA);
        let values = write(&dir, "values.json", r#"{"name": "Ada", "address": {"city": "Oslo"}}"#);

        let result = run_values(&schema, Some(&values), offline()).await.unwrap();
        assert_eq!(
            result,
            json!({"name": "Ada", "plan": "basic", "address": {"city": "Oslo"}})
        );
    }

    #[tokio::test]
    async fn validate_command_reports_failures() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "form.yaml", SCHEMA);
        let values = write(&dir, "values.yml", "plan: pro\n");

        let report = run_validate(&schema, &values, offline()).await.unwrap();
        assert!(Validator::has_errors(&report));
        assert_eq!(
            render_report(&report, false).unwrap(),
            "name: name is required"
        );
    }

    #[tokio::test]
    async fn values_file_must_be_an_object() {
        let dir = TempDir::new().unwrap();
        let values = write(&dir, "values.json", "[1, 2]");
        let err = read_values(&values).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidValues { .. }));
    }

    #[tokio::test]
    async fn missing_values_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = read_values(&dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, CliError::ReadValues { .. }));
    }

    #[test]
    fn passing_report_renders_summary() {
        let mut report = ValidationReport::new();
        report.insert("name".into(), ValidationResult::valid());
        assert_eq!(
            render_report(&report, false).unwrap(),
            "All 1 validated field(s) passed"
        );
        let json = render_report(&report, true).unwrap();
        assert!(json.contains("\"isValid\": true"));
    }
}
