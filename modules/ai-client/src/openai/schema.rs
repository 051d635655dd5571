use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as strict OpenAI structured output.
///
/// Strict mode wants every object closed (`additionalProperties: false`),
/// every property listed in `required` (nullable ones included) and no
/// `$ref` indirection, so the schemars output is rewritten accordingly.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn openai_schema() -> Value {
        let root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        let definitions = root
            .get("definitions")
            .cloned()
            .unwrap_or(Value::Object(Map::new()));
        let mut schema = strictify(root, &definitions);

        if let Value::Object(map) = &mut schema {
            map.remove("definitions");
            map.remove("$schema");
        }

        schema
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn strictify(value: Value, definitions: &Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(Value::String(path)) = map.get("$ref") {
                let name = path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(name) {
                    return strictify(def.clone(), definitions);
                }
            }

            // schemars wraps documented refs in a single-element allOf
            if let Some(Value::Array(all_of)) = map.get("allOf") {
                if all_of.len() == 1 {
                    let mut inner = strictify(all_of[0].clone(), definitions);
                    if let (Value::Object(inner_map), Some(desc)) =
                        (&mut inner, map.get("description"))
                    {
                        inner_map
                            .entry("description")
                            .or_insert_with(|| desc.clone());
                    }
                    return inner;
                }
            }

            let is_object = map.get("type") == Some(&Value::String("object".into()));
            if is_object {
                map.insert("additionalProperties".into(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let required = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".into(), Value::Array(required));
                }
            }

            Value::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let v = if k == "definitions" {
                            v
                        } else {
                            strictify(v, definitions)
                        };
                        (k, v)
                    })
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| strictify(item, definitions))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename_all = "snake_case")]
    enum Kind {
        Influencer,
        Podcaster,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Contact {
        name: String,
        email: Option<String>,
        /// Contact category
        kind: Kind,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Payload {
        contacts: Vec<Contact>,
    }

    #[test]
    fn nested_objects_are_inlined_and_closed() {
        let schema = Payload::openai_schema();
        let obj = schema.as_object().unwrap();
        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("$schema"));
        assert_eq!(obj["additionalProperties"], Value::Bool(false));

        let item = &schema["properties"]["contacts"]["items"];
        assert!(item.get("$ref").is_none());
        assert_eq!(item["type"], "object");
        assert_eq!(item["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn nullable_fields_are_still_required() {
        let schema = Contact::openai_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"name"));
        assert!(required.contains(&"email"));
        assert!(required.contains(&"kind"));
    }

    #[test]
    fn enum_refs_resolve_to_string_enums() {
        let schema = Contact::openai_schema();
        let kind = &schema["properties"]["kind"];
        assert!(kind.get("$ref").is_none());
        assert!(kind.get("allOf").is_none());
        let variants = kind["enum"].as_array().unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(kind["description"], "Contact category");
    }
}
