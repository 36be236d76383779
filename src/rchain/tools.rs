use serde_json::{Map, Value, json};

/// JSON schema primitive types supported for tool parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolParamType {
    Integer,
    String,
}

impl ToolParamType {
    fn as_str(self) -> &'static str {
        match self {
            ToolParamType::Integer => "integer",
            ToolParamType::String => "string",
        }
    }
}

/// One function parameter definition.
#[derive(Debug, Clone)]
pub struct ToolParam {
    /// Parameter name.
    pub name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// JSON schema type.
    pub kind: ToolParamType,
    /// Whether the parameter is required.
    pub required: bool,
    /// Inclusive lower bound for numeric parameters.
    pub minimum: Option<i64>,
    /// Inclusive upper bound for numeric parameters.
    pub maximum: Option<i64>,
    /// Value the tool assumes when the parameter is omitted.
    pub default: Option<Value>,
}

impl ToolParam {
    /// Builds a parameter definition without bounds or default.
    pub fn new(name: impl Into<String>, kind: ToolParamType, required: bool) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            required,
            minimum: None,
            maximum: None,
            default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares an inclusive numeric range.
    pub fn with_bounds(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn to_schema(&self) -> Value {
        let mut param_def = Map::new();
        param_def.insert(
            "type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        if let Some(description) = &self.description {
            param_def.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        if let Some(minimum) = self.minimum {
            param_def.insert("minimum".to_string(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            param_def.insert("maximum".to_string(), json!(maximum));
        }
        if let Some(default) = &self.default {
            param_def.insert("default".to_string(), default.clone());
        }
        Value::Object(param_def)
    }
}

/// Callable tool function definition.
#[derive(Debug, Clone)]
pub struct ToolFunction {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: String,
    /// Parameter definitions.
    pub params: Vec<ToolParam>,
}

impl ToolFunction {
    /// Creates a function definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Appends one parameter definition.
    pub fn with_param(mut self, param: ToolParam) -> Self {
        self.params.push(param);
        self
    }

    fn to_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(param.name.clone(), param.to_schema());
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }
}

/// Tool wrapper matching chat-completions function-calling schema.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Function declaration.
    pub function: ToolFunction,
}

impl ToolDefinition {
    /// Wraps a function definition as a tool.
    pub fn from_function(function: ToolFunction) -> Self {
        Self { function }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Serializes the tool declaration to JSON.
    pub fn to_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.function.name,
                "description": self.function.description,
                "parameters": self.function.to_schema(),
            }
        })
    }
}

/// Tool call emitted by a model.
///
/// Immutable once parsed: the loop replays it verbatim in the transcript and
/// answers it with exactly one tool-result message carrying `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Provider-generated correlation id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tool/function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialized arguments exactly as the model produced them.
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Decodes the argument payload, treating anything that is not a JSON
    /// object as an empty argument set.
    pub fn parsed_arguments(&self) -> Map<String, Value> {
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Serializes a tool call payload to provider JSON format.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.arguments,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_carries_bounds_default_and_required() {
        let tool = ToolDefinition::from_function(
            ToolFunction::new("lookup", "Looks things up.")
                .with_param(ToolParam::new("city", ToolParamType::String, true))
                .with_param(
                    ToolParam::new("hours", ToolParamType::Integer, false)
                        .with_bounds(1, 24)
                        .with_default(12),
                ),
        );

        let body = tool.to_json();
        let params = &body["function"]["parameters"];
        assert_eq!(body["type"], "function");
        assert_eq!(params["required"], json!(["city"]));
        assert_eq!(params["properties"]["city"], json!({"type": "string"}));
        assert_eq!(
            params["properties"]["hours"],
            json!({"type": "integer", "minimum": 1, "maximum": 24, "default": 12})
        );
    }

    #[test]
    fn malformed_arguments_decode_to_empty_map() {
        assert!(ToolCall::new("1", "t", "{not json").parsed_arguments().is_empty());
        assert!(ToolCall::new("1", "t", "[1, 2]").parsed_arguments().is_empty());
        assert!(ToolCall::new("1", "t", "").parsed_arguments().is_empty());
    }

    #[test]
    fn tool_call_json_keeps_raw_arguments() {
        let call = ToolCall::new("call_1", "lookup", r#"{"city":"Oslo"}"#);
        assert_eq!(
            call.to_json(),
            json!({
                "id": "call_1",
                "type": "function",
                "function": {"name": "lookup", "arguments": "{\"city\":\"Oslo\"}"}
            })
        );
    }
}
