use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Machine-readable description of a CLI command, printed by `list-tools`
/// so an agent can discover the available operations and their flags.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn quote_schema(with_mode: bool) -> Value {
    let mut properties = json!({
        "origin": {
            "type": "string",
            "description": "Origin UN/LOCODE, airport code or address"
        },
        "destination": {
            "type": "string",
            "description": "Destination UN/LOCODE, airport code or address"
        },
        "loadtype": {
            "type": "string",
            "description": "e.g. boxes, pallets, container20, container40, container40HC"
        },
        "weight": {"type": "number", "exclusiveMinimum": 0},
        "weight-unit": {"type": "string", "enum": ["kg", "lb"]},
        "width": {"type": "number"},
        "length": {"type": "number"},
        "height": {"type": "number"},
        "dimension-unit": {"type": "string", "enum": ["cm", "in"]},
        "volume": {"type": "number"},
        "volume-unit": {"type": "string", "enum": ["cbm", "cft"]},
        "quantity": {"type": "integer", "minimum": 1},
        "haz-code": {"type": "string", "description": "Hazardous material UN code"}
    });
    if with_mode {
        if let Some(map) = properties.as_object_mut() {
            map.insert(
                "mode".into(),
                json!({
                    "type": "string",
                    "description": "Restrict to one mode, e.g. air, LCL, FCL, express"
                }),
            );
        }
    }
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
        "required": ["origin", "destination", "loadtype", "weight"]
    })
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    let get_quote = ToolDescriptor {
        name: "get-quote".into(),
        description: "Get freight rates for a shipment".into(),
        input_schema: quote_schema(true),
    };

    let get_estimate = ToolDescriptor {
        name: "get-estimate".into(),
        description: "Get a quick rate estimate for a shipment".into(),
        input_schema: quote_schema(true),
    };

    let compare_rates = ToolDescriptor {
        name: "compare-rates".into(),
        description: "Compare rates across all available transport modes".into(),
        input_schema: quote_schema(false),
    };

    let rate_limit = ToolDescriptor {
        name: "rate-limit".into(),
        description: "Show local API usage for the rolling hour (no network call)".into(),
        input_schema: json!({"type": "object", "additionalProperties": false, "properties": {}}),
    };

    let list_tools = ToolDescriptor {
        name: "list-tools".into(),
        description: "List available commands".into(),
        input_schema: json!({"type": "object", "additionalProperties": false, "properties": {}}),
    };

    vec![get_quote, get_estimate, compare_rates, rate_limit, list_tools]
}
