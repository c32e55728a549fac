use serde_json::Value;

/// Block `type` tags that mark a tool invocation. The service has spelled
/// this three ways across versions; all are accepted as synonyms.
const TOOL_CALL_TAGS: [&str; 3] = ["tool_call", "tool_use", "custom_tool_call"];

/// Field aliases probed, in order, when a tool payload arrives as an
/// object instead of a raw string.
const PAYLOAD_FIELDS: [&str; 4] = ["input", "code", "script", "text"];

/// Outcome of script extraction. `script` is always trimmed and never null;
/// an empty script with possibly non-empty `text` is a valid non-error
/// outcome (an extraction miss) that callers handle explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    pub script: String,
    pub text: String,
}

/// Locate the tool invocation matching `expected_tool` in a best-effort
/// shaped response and pull out its textual payload.
///
/// The response comes from a third-party service whose shape is not
/// contractually stable, so this never fails: unrecognized or malformed
/// shapes degrade to an empty script plus whatever free text was present.
/// If no block carries the expected tool name, a second pass accepts any
/// tool-tagged block — the service may have renamed or mis-routed the call.
pub fn extract(response: &Value, expected_tool: &str) -> Extraction {
    let text = response
        .get("output_text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let Some(blocks) = response.get("output").and_then(Value::as_array) else {
        return Extraction { script: String::new(), text };
    };

    if let Some(script) = scan_blocks(blocks, Some(expected_tool)) {
        return Extraction { script, text };
    }

    // Fallback: accept any tool invocation regardless of declared name.
    if let Some(script) = scan_blocks(blocks, None) {
        return Extraction { script, text };
    }

    Extraction { script: String::new(), text }
}

fn scan_blocks(blocks: &[Value], expected_tool: Option<&str>) -> Option<String> {
    for block in blocks {
        let tag = block.get("type").and_then(Value::as_str).unwrap_or_default();
        if !TOOL_CALL_TAGS.contains(&tag) {
            continue;
        }

        if let Some(expected) = expected_tool {
            let name = block.get("name").and_then(Value::as_str).unwrap_or_default();
            if name != expected {
                continue;
            }
        }

        // `arguments` takes precedence only when it actually carries a
        // payload shape; a null or numeric `arguments` does not mask `input`.
        let payload = match block.get("arguments") {
            Some(value) if value.is_string() || value.is_object() => Some(value),
            _ => block.get("input"),
        };
        if let Some(script) = payload.and_then(payload_text) {
            return Some(script);
        }
    }

    None
}

fn payload_text(payload: &Value) -> Option<String> {
    match payload {
        Value::String(raw) => non_empty_trimmed(raw),
        Value::Object(fields) => PAYLOAD_FIELDS.iter().find_map(|field| {
            fields.get(*field).and_then(Value::as_str).and_then(non_empty_trimmed)
        }),
        _ => None,
    }
}

fn non_empty_trimmed(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
