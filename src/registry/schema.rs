use serde_json::Value as Json;
use std::fmt;

/// The JSON shape a configuration field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A non-negative integer.
    Count,
    Number,
    StringList,
    /// A list of `{ "when"?: predicate, "target": node_id }` objects.
    BranchList,
}

impl FieldType {
    fn accepts(&self, value: &Json) -> bool {
        match self {
            FieldType::Count => value.as_u64().is_some(),
            FieldType::Number => value.is_number(),
            FieldType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Json::is_string)),
            FieldType::BranchList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Json::is_object)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::Count => "count",
            FieldType::Number => "number",
            FieldType::StringList => "string[]",
            FieldType::BranchList => "branch[]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigField {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub description: &'static str,
}

impl ConfigField {
    pub const fn required(
        name: &'static str,
        field_type: FieldType,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            field_type,
            required: true,
            description,
        }
    }

    pub const fn optional(
        name: &'static str,
        field_type: FieldType,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            field_type,
            required: false,
            description,
        }
    }
}

/// Describes the configuration object a node type accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
}

impl ConfigSchema {
    pub fn new(fields: Vec<ConfigField>) -> Self {
        Self { fields }
    }

    /// Checks an authored configuration against the schema. A missing (`null`)
    /// configuration is treated as an empty object.
    pub fn check(&self, config: &Json) -> Result<(), String> {
        let empty = serde_json::Map::new();
        let object = match config {
            Json::Null => &empty,
            Json::Object(map) => map,
            other => return Err(format!("configuration must be an object, found {}", other)),
        };

        if let Some(unknown) = object
            .keys()
            .find(|key| !self.fields.iter().any(|f| f.name == key.as_str()))
        {
            return Err(format!("unknown configuration field '{}'", unknown));
        }

        for field in &self.fields {
            match object.get(field.name) {
                None | Some(Json::Null) if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                Some(value) if !value.is_null() && !field.field_type.accepts(value) => {
                    return Err(format!(
                        "field '{}' must be of type {}",
                        field.name,
                        field.field_type.name()
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return writeln!(f, "    (no configuration)");
        }
        for field in &self.fields {
            writeln!(
                f,
                "    {}{}: {} - {}",
                field.name,
                if field.required { "" } else { "?" },
                field.field_type.name(),
                field.description
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number_schema() -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigField::optional("min", FieldType::Number, "lower bound"),
            ConfigField::optional("max", FieldType::Number, "upper bound"),
        ])
    }

    #[test]
    fn null_config_is_an_empty_object() {
        assert!(number_schema().check(&Json::Null).is_ok());
    }

    #[test]
    fn rejects_unknown_and_mistyped_fields() {
        let schema = number_schema();
        assert!(schema.check(&json!({"minimum": 1})).unwrap_err().contains("minimum"));
        assert!(schema.check(&json!({"min": "one"})).unwrap_err().contains("number"));
        assert!(schema.check(&json!([1, 2])).is_err());
    }

    #[test]
    fn requires_required_fields() {
        let schema = ConfigSchema::new(vec![ConfigField::required(
            "options",
            FieldType::StringList,
            "labels",
        )]);
        assert!(schema.check(&json!({})).unwrap_err().contains("options"));
        assert!(schema.check(&json!({"options": ["a", "b"]})).is_ok());
        assert!(schema.check(&json!({"options": ["a", 2]})).is_err());
    }
}
