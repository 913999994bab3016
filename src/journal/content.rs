use serde_json::Value;

/// Block kinds whose `text` field is user-visible prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    InputText,
    OutputText,
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(Self::Text),
            "input_text" => Some(Self::InputText),
            "output_text" => Some(Self::OutputText),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub kind: Option<String>,
    pub text: Option<Value>,
    pub content: Option<Value>,
}

impl ContentBlock {
    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        Self {
            kind: map.get("type").and_then(Value::as_str).map(ToOwned::to_owned),
            text: map.get("text").cloned(),
            content: map.get("content").cloned(),
        }
    }

    fn allowed_kind(&self) -> Option<BlockKind> {
        self.kind.as_deref().and_then(BlockKind::from_tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Text(String),
    Block(ContentBlock),
}

/// The three shapes a message `content` value takes in session logs.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Block(ContentBlock),
    Blocks(Vec<BlockItem>),
}

impl Content {
    /// `None` for shapes that carry no text at all (numbers, booleans, null).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Object(map) => Some(Self::Block(ContentBlock::from_object(map))),
            Value::Array(items) => Some(Self::Blocks(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(BlockItem::Text(s.clone())),
                        Value::Object(map) => {
                            Some(BlockItem::Block(ContentBlock::from_object(map)))
                        }
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Block(block) => {
                let field = block
                    .text
                    .as_ref()
                    .filter(|v| truthy(v))
                    .or_else(|| block.content.as_ref().filter(|v| truthy(v)));
                field.map(stringify).unwrap_or_default().trim().to_string()
            }
            Self::Blocks(items) => {
                let parts = items.iter().filter_map(|item| match item {
                    BlockItem::Text(s) => Some(s.clone()),
                    BlockItem::Block(block) => block_fragment(block),
                });
                parts
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}

fn block_fragment(block: &ContentBlock) -> Option<String> {
    if block.allowed_kind().is_some() {
        return block.text.as_ref().filter(|v| truthy(v)).map(stringify);
    }
    match &block.content {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Plain text of any decoded `content` value; empty for unrecognised shapes.
pub fn extract_text(value: &Value) -> String {
    Content::from_value(value)
        .map(|content| content.text())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{BlockKind, Content, extract_text};
    use serde_json::json;

    #[test]
    fn plain_string_is_trimmed() {
        assert_eq!(extract_text(&json!("  hello  ")), "hello");
    }

    #[test]
    fn single_block_falls_back_to_content_field() {
        assert_eq!(extract_text(&json!({"text": "a"})), "a");
        assert_eq!(extract_text(&json!({"text": "", "content": "b"})), "b");
        assert_eq!(extract_text(&json!({"content": 42})), "42");
        assert_eq!(extract_text(&json!({"other": "x"})), "");
    }

    #[test]
    fn block_sequence_keeps_allowed_kinds_and_unmarked_content() {
        let value = json!([
            " first ",
            {"type": "text", "text": "second"},
            {"type": "toolUse", "name": "exec", "text": "ignored"},
            {"type": "input_text", "text": "third"},
            {"content": "fourth"},
            {"type": "text"},
            {"type": "output_text", "text": "   "},
            7
        ]);
        assert_eq!(extract_text(&value), "first\nsecond\nthird\nfourth");
    }

    #[test]
    fn allowed_block_without_text_does_not_borrow_content() {
        let value = json!([{"type": "text", "content": "hidden"}]);
        assert_eq!(extract_text(&value), "");
    }

    #[test]
    fn unrecognised_shapes_yield_empty_text() {
        assert_eq!(extract_text(&json!(null)), "");
        assert_eq!(extract_text(&json!(3.5)), "");
        assert_eq!(extract_text(&json!([[["deep"]]])), "");
        assert_eq!(extract_text(&json!([{"content": {"nested": ["x"]}}])), "");
        assert!(Content::from_value(&json!(true)).is_none());
    }

    #[test]
    fn block_kind_allow_list_is_closed() {
        assert_eq!(BlockKind::from_tag("output_text"), Some(BlockKind::OutputText));
        assert_eq!(BlockKind::from_tag("thinking"), None);
    }
}
