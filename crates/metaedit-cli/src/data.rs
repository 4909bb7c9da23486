//! Loading JSON data sets and records from the command line.

use anyhow::{anyhow, Context, Result};
use metaedit_model::{InMemoryProvider, Model, PropertyValueBag, ProviderRegistry};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read a data set shaped `{"<provider>": [<record>, ...], ...}` into one
/// in-memory provider per key.
pub fn load_data_set(path: &Path) -> Result<ProviderRegistry> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    registry_from_value(value).with_context(|| format!("loading data set {}", path.display()))
}

pub fn registry_from_value(value: Value) -> Result<ProviderRegistry> {
    let Value::Object(providers) = value else {
        return Err(anyhow!("data set must be an object keyed by provider name"));
    };

    let mut registry = ProviderRegistry::new();
    for (name, records) in providers {
        let Value::Array(records) = records else {
            return Err(anyhow!("records of `{name}` must be an array"));
        };
        let models = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                json_object(record)
                    .map(|object| Model::from_json_object(name.as_str(), object))
                    .with_context(|| format!("record #{index} of `{name}`"))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(provider = %name, records = models.len(), "loaded provider");
        registry.register(Arc::new(InMemoryProvider::with_records(name, models)));
    }
    Ok(registry)
}

/// Parse a record given inline as a JSON object.
pub fn parse_record(provider: &str, text: &str) -> Result<Model> {
    let value: Value = serde_json::from_str(text).context("parsing --record")?;
    Ok(Model::from_json_object(provider, json_object(value)?))
}

/// Parse pending input values given inline as a JSON object.
pub fn parse_input(text: &str) -> Result<PropertyValueBag> {
    let value: Value = serde_json::from_str(text).context("parsing --input")?;
    let mut bag = PropertyValueBag::new();
    for (name, value) in json_object(value)? {
        bag.set_property_value(&name, value);
    }
    Ok(bag)
}

fn json_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(anyhow!("expected a JSON object, found `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaedit_model::{Record, RecordId};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn data_set_registers_one_provider_per_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "tl_page": [{"id": 1, "pid": 0}, {"id": 2, "pid": 1}],
                "tl_article": [{"id": 10, "pid": 2}]
            })
        )
        .unwrap();

        let registry = load_data_set(file.path()).unwrap();
        assert!(registry.contains("tl_page"));
        assert!(registry.contains("tl_article"));

        let page = registry.get("tl_page").unwrap().fetch_one(&RecordId::Int(2)).unwrap().unwrap();
        assert_eq!(page.provider_name(), "tl_page");
        assert_eq!(page.property("pid"), Some(&json!(1)));
    }

    #[test]
    fn non_object_records_are_rejected() {
        let err = registry_from_value(json!({"tl_page": [1, 2]})).unwrap_err();
        assert!(format!("{err:#}").contains("record #0 of `tl_page`"));

        assert!(registry_from_value(json!([])).is_err());
        assert!(registry_from_value(json!({"tl_page": {"id": 1}})).is_err());
    }

    #[test]
    fn inline_record_and_input() {
        let record = parse_record("tl_content", r#"{"id": 4, "type": "text"}"#).unwrap();
        assert_eq!(record.model_id().unwrap().serialized(), "tl_content::4");

        let input = parse_input(r#"{"type": "image", "addImage": true}"#).unwrap();
        assert_eq!(input.property_value("type"), Some(&json!("image")));
        assert_eq!(input.len(), 2);

        assert!(parse_input("[1]").is_err());
    }
}
