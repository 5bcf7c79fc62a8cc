//! Output formatting for composed schemas and instances.

use schema_link_core::{ComposedSchema, ModelInstance, Value};
use serde::Serialize;

/// Supported schema output formats.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Supported instance output formats.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum InstanceFormat {
    Json,
    Yaml,
}

#[derive(Serialize)]
struct SchemaView<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    fields: Vec<FieldView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<LinkView<'a>>,
}

#[derive(Serialize)]
struct FieldView<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: String,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<&'a Value>,
    source: String,
}

#[derive(Serialize)]
struct LinkView<'a> {
    name: &'a str,
    model: &'a str,
    fields: usize,
}

impl<'a> SchemaView<'a> {
    fn new(schema: &'a ComposedSchema) -> Self {
        Self {
            model: schema.name(),
            description: schema.definition().description.as_deref(),
            fields: schema
                .fields()
                .iter()
                .map(|field| FieldView {
                    name: &field.name,
                    field_type: field.field_type().to_string(),
                    required: field.is_required(),
                    default: field.default.as_ref(),
                    source: field.source.to_string(),
                })
                .collect(),
            links: schema
                .links()
                .iter()
                .map(|link| LinkView {
                    name: &link.name,
                    model: link.schema.name(),
                    fields: link.schema.len(),
                })
                .collect(),
        }
    }
}

/// Formats a composed schema in the requested output format.
pub fn format_schema(schema: &ComposedSchema, format: OutputFormat) -> Result<String, String> {
    let view = SchemaView::new(schema);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&view)
            .map(|json| json + "\n")
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&view).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(schema_to_markdown(&view)),
        OutputFormat::Table => Ok(schema_to_table(&view)),
    }
}

/// Formats a built instance as nested JSON or YAML.
pub fn format_instance(instance: &ModelInstance, format: InstanceFormat) -> Result<String, String> {
    match format {
        InstanceFormat::Json => serde_json::to_string_pretty(instance)
            .map(|json| json + "\n")
            .map_err(|e| format!("JSON serialization failed: {e}")),
        InstanceFormat::Yaml => {
            serde_yaml::to_string(instance).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

fn default_text(default: Option<&Value>) -> String {
    default
        .and_then(|value| serde_json::to_string(value).ok())
        .unwrap_or_default()
}

fn schema_to_markdown(view: &SchemaView<'_>) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", view.model));

    if let Some(desc) = view.description {
        out.push_str(&format!("{desc}\n\n"));
    }

    out.push_str("## Fields\n\n");
    out.push_str("| Field | Type | Required | Default | Source |\n");
    out.push_str("|-------|------|----------|---------|--------|\n");
    for field in &view.fields {
        let required = if field.required { "yes" } else { "no" };
        let default = default_text(field.default);
        out.push_str(&format!(
            "| `{}` | {} | {required} | {default} | {} |\n",
            field.name, field.field_type, field.source
        ));
    }

    if !view.links.is_empty() {
        out.push_str("\n## Links\n\n");
        out.push_str("| Link | Model | Fields |\n");
        out.push_str("|------|-------|--------|\n");
        for link in &view.links {
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                link.name, link.model, link.fields
            ));
        }
    }

    out
}

fn schema_to_table(view: &SchemaView<'_>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Model: {}  Fields: {}  Links: {}\n",
        view.model,
        view.fields.len(),
        view.links.len()
    ));
    if let Some(desc) = view.description {
        out.push_str(&format!("  {desc}\n"));
    }

    if view.fields.is_empty() {
        return out;
    }

    let max_name = view.fields.iter().map(|f| f.name.len()).max().unwrap_or(4);
    let max_type = view
        .fields
        .iter()
        .map(|f| f.field_type.len())
        .max()
        .unwrap_or(4);

    out.push('\n');
    for field in &view.fields {
        let marker = if field.required { "*" } else { " " };
        out.push_str(&format!(
            "  {marker} {:<max_name$}  {:<max_type$}  {}",
            field.name, field.field_type, field.source
        ));
        if field.default.is_some() {
            out.push_str(&format!("  [default: {}]", default_text(field.default)));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use schema_link_core::{FieldDescriptor, FieldType, LinkDecl, ModelDefinition, SchemaRegistry};

    use super::*;

    fn schema() -> std::sync::Arc<ComposedSchema> {
        let mut registry = SchemaRegistry::new();
        registry
            .define(
                ModelDefinition::new("Database")
                    .with_field(FieldDescriptor::required("host", FieldType::Str))
                    .with_field(
                        FieldDescriptor::required("port", FieldType::Int)
                            .with_default(serde_json::json!(5432)),
                    ),
            )
            .unwrap();
        registry
            .define(
                ModelDefinition::new("Service")
                    .with_description("An API service")
                    .with_field(FieldDescriptor::required("title", FieldType::Str))
                    .with_link(LinkDecl::new("db", "Database")),
            )
            .unwrap()
    }

    #[test]
    fn test_format_schema_json() {
        let json = format_schema(&schema(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["model"], "Service");
        assert_eq!(value["fields"][2]["name"], "db_port");
        assert_eq!(value["fields"][2]["default"], 5432);
        assert_eq!(value["fields"][2]["source"], "Database.port (via link db)");
        assert_eq!(value["links"][0]["model"], "Database");
    }

    #[test]
    fn test_format_schema_markdown() {
        let md = format_schema(&schema(), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Service\n\nAn API service\n"));
        assert!(md.contains("| `db_host` | str | yes |  | Database.host (via link db) |"));
        assert!(md.contains("## Links"));
    }

    #[test]
    fn test_format_schema_table() {
        let table = format_schema(&schema(), OutputFormat::Table).unwrap();
        assert!(table.starts_with("Model: Service  Fields: 3  Links: 1\n"));
        assert!(table.contains("[default: 5432]"));
    }
}
