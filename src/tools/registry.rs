//! Tool registry: the fixed, ordered set of tools offered to the model.
//!
//! Provides:
//! - Lookup by unique tool name
//! - Tool definitions for advertisement, in registration order
//! - Validation that a tool call carries the fields its schema requires

use serde_json::Value;

use crate::inference::types::ToolDefinition;

use super::errors::ToolError;
use super::NoteTool;

/// Ordered collection of tools keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn NoteTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Append a tool. Names must be unique.
    pub fn register(&mut self, tool: Box<dyn NoteTool>) -> Result<(), ToolError> {
        if self.get(tool.name()).is_some() {
            return Err(ToolError::DuplicateTool {
                name: tool.name().to_string(),
            });
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn NoteTool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| &**t)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// Validate a tool call: tool exists and required fields are present.
    ///
    /// This is a structural check against the schema's `required` list; the
    /// tool itself checks value types.
    pub fn validate_tool_call(&self, tool_name: &str, arguments: &Value) -> Result<(), ToolError> {
        let tool = self.get(tool_name).ok_or_else(|| ToolError::UnknownTool {
            name: tool_name.to_string(),
        })?;

        if !arguments.is_object() && !arguments.is_null() {
            return Err(ToolError::InvalidArguments {
                tool: tool_name.to_string(),
                reason: "arguments must be a JSON object".into(),
            });
        }

        let schema = tool.parameters();
        let required = schema
            .get("required")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        for field in required.iter().filter_map(|f| f.as_str()) {
            let present = arguments
                .get(field)
                .map(|v| !v.is_null())
                .unwrap_or(false);
            if !present {
                return Err(ToolError::InvalidArguments {
                    tool: tool_name.to_string(),
                    reason: format!("missing required field: '{field}'"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolReply;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl NoteTool for Echo {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "Echo the text back"
        }
        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }
        async fn call(&self, arguments: &Value) -> Result<ToolReply, ToolError> {
            Ok(ToolReply::json(arguments))
        }
    }

    fn registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(Box::new(Echo("first"))).unwrap();
        reg.register(Box::new(Echo("second"))).unwrap();
        reg
    }

    #[test]
    fn test_register_keeps_order() {
        let reg = registry();
        assert_eq!(reg.names(), vec!["first", "second"]);
        let defs = reg.definitions();
        assert_eq!(defs[1].function.name, "second");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut reg = registry();
        let err = reg.register(Box::new(Echo("first"))).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool { .. }));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_validate_tool_call_valid() {
        assert!(registry()
            .validate_tool_call("first", &json!({"text": "hi"}))
            .is_ok());
    }

    #[test]
    fn test_validate_tool_call_missing_required() {
        let err = registry()
            .validate_tool_call("first", &json!({"text": null}))
            .unwrap_err();
        assert!(err.to_string().contains("missing required field: 'text'"));
    }

    #[test]
    fn test_validate_tool_call_unknown_tool() {
        assert!(matches!(
            registry().validate_tool_call("nope", &json!({})),
            Err(ToolError::UnknownTool { .. })
        ));
    }

    #[test]
    fn test_validate_tool_call_non_object() {
        assert!(registry()
            .validate_tool_call("first", &json!(["text"]))
            .is_err());
    }
}
