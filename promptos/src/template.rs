//! Bracketed `[NAME]` placeholders inside free-form prompt text.
//!
//! Parsing never fails: anything that does not look like a complete token
//! (unterminated `[`, empty `[]`, a token spanning a line break) is kept as
//! literal text.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// A `]` closes the nearest preceding `[`: token bodies exclude both brackets.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]\r\n]+)\]").expect("token pattern should compile"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TemplateSegment {
    Literal { text: String },
    Variable { name: String },
}

impl TemplateSegment {
    /// The exact source text this segment was parsed from.
    pub fn text(&self) -> String {
        match self {
            TemplateSegment::Literal { text } => text.clone(),
            TemplateSegment::Variable { name } => placeholder(name),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, TemplateSegment::Variable { .. })
    }

    pub fn var_name(&self) -> Option<&str> {
        match self {
            TemplateSegment::Variable { name } => Some(name),
            TemplateSegment::Literal { .. } => None,
        }
    }
}

pub fn placeholder(name: &str) -> String {
    format!("[{name}]")
}

/// Splits `content` into literal and variable segments. Empty content yields
/// an empty sequence.
pub fn parse(content: &str) -> Vec<TemplateSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in TOKEN.captures_iter(content) {
        let whole = caps.get(0).expect("capture 0 is always present");
        if whole.start() > cursor {
            segments.push(TemplateSegment::Literal {
                text: content[cursor..whole.start()].to_string(),
            });
        }
        segments.push(TemplateSegment::Variable {
            name: caps[1].to_string(),
        });
        cursor = whole.end();
    }

    if cursor < content.len() {
        segments.push(TemplateSegment::Literal {
            text: content[cursor..].to_string(),
        });
    }

    segments
}

/// Unique variable names in order of first appearance.
pub fn extract_variable_names(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    parse(content)
        .into_iter()
        .filter_map(|segment| match segment {
            TemplateSegment::Variable { name } => Some(name),
            TemplateSegment::Literal { .. } => None,
        })
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Substitutes bound, non-empty values. Unfilled variables stay visible as
/// `[NAME]`.
pub fn compile(segments: &[TemplateSegment], bindings: &VariableBindings) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            TemplateSegment::Literal { text } => out.push_str(text),
            TemplateSegment::Variable { name } => match bindings.get(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(&placeholder(name)),
            },
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CopyMode {
    Raw,
    #[default]
    Compiled,
}

/// Parsed prompt content, kept alongside its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    content: String,
    segments: Vec<TemplateSegment>,
}

impl Template {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let segments = parse(&content);
        Self { content, segments }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    pub fn variables(&self) -> Vec<String> {
        extract_variable_names(&self.content)
    }

    pub fn has_variables(&self) -> bool {
        self.segments.iter().any(TemplateSegment::is_variable)
    }

    pub fn compile(&self, bindings: &VariableBindings) -> String {
        compile(&self.segments, bindings)
    }

    /// Text to hand to the clipboard or the AI runner. Compiled mode only
    /// differs from raw when the template has variables.
    pub fn render(&self, mode: CopyMode, bindings: &VariableBindings) -> String {
        match mode {
            CopyMode::Compiled if self.has_variables() => self.compile(bindings),
            _ => self.content.clone(),
        }
    }
}

/// User-entered values for one open prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBindings {
    prompt_id: Option<String>,
    values: HashMap<String, String>,
}

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_prompt(prompt_id: impl Into<String>) -> Self {
        Self {
            prompt_id: Some(prompt_id.into()),
            values: HashMap::new(),
        }
    }

    pub fn prompt_id(&self) -> Option<&str> {
        self.prompt_id.as_deref()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value only when it is non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Opening a different prompt drops every value entered for the previous one.
    pub fn reset_for(&mut self, prompt_id: &str) {
        if self.prompt_id.as_deref() != Some(prompt_id) {
            self.values.clear();
            self.prompt_id = Some(prompt_id.to_string());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for VariableBindings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = VariableBindings::new();
        for (name, value) in iter {
            bindings.set(name, value);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(content: &str) -> String {
        parse(content).iter().map(TemplateSegment::text).collect()
    }

    #[test]
    fn parse_is_lossless() {
        for content in [
            "",
            "plain text",
            "Hi [NAME]",
            "[A][B]",
            "[unterminated",
            "trailing ]",
            "[]",
            "[a[b]",
            "line [one\ntwo]",
            "ünïcødé [ВАР] ok",
        ] {
            assert_eq!(joined(content), content, "content: {content:?}");
        }
    }

    #[test]
    fn empty_content_has_no_segments() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn closing_bracket_binds_to_nearest_open() {
        let segments = parse("[a[b]");
        assert_eq!(
            segments,
            vec![
                TemplateSegment::Literal {
                    text: "[a".to_string()
                },
                TemplateSegment::Variable {
                    name: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn malformed_brackets_stay_literal() {
        assert!(parse("[]").iter().all(|s| !s.is_variable()));
        assert!(parse("open [ only").iter().all(|s| !s.is_variable()));
        assert!(parse("[split\nline]").iter().all(|s| !s.is_variable()));
    }

    #[test]
    fn reset_for_same_prompt_keeps_values() {
        let mut bindings = VariableBindings::for_prompt("p1");
        bindings.set("X", "1");
        bindings.reset_for("p1");
        assert_eq!(bindings.get("X"), Some("1"));

        bindings.reset_for("p2");
        assert!(bindings.is_empty());
        assert_eq!(bindings.prompt_id(), Some("p2"));
    }
}
