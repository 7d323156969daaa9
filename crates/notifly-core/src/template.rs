//! Message templates — `{{variable}}` substitution with `if` and `each` blocks.
//!
//! Grammar:
//! - `{{name}}` — replaced by the value's string form; unknown names become `""`
//! - `{{#if name}}…{{/if}}` — body kept when `name` is truthy, whole block dropped otherwise
//! - `{{#each name}}…{{/each}}` — body repeated per array element, `{{this}}` is the element
//!
//! `if` blocks are resolved first, over the raw template. `each` blocks and
//! plain variables are then expanded in a single pass, so a substituted value
//! is never scanned again: a data value or loop item that looks like template
//! syntax comes out verbatim. An `if` may sit inside an `each` body and vice
//! versa. Deeper nesting, escaping, and validation are not supported: an
//! unterminated block is left in the output as-is.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// Data bound to a template at render time.
pub type TemplateData = serde_json::Map<String, Value>;

static IF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#if\s+(\w+)\s*\}\}(.*?)\{\{/if\}\}").expect("if-block regex")
});

/// An `each` block (groups 1, 2) or a plain variable (group 3).
static EACH_OR_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#each\s+(\w+)\s*\}\}(.*?)\{\{/each\}\}|\{\{\s*(\w+)\s*\}\}")
        .expect("each-or-variable regex")
});

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("variable regex"));

/// A reusable template string.
///
/// Immutable once built; render it as many times as needed with different data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Expand this template against `data`.
    pub fn render(&self, data: &TemplateData) -> String {
        render(&self.source, data)
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Template::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Template::new(source)
    }
}

/// Expand `template` against `data`.
pub fn render(template: &str, data: &TemplateData) -> String {
    let kept = IF_BLOCK.replace_all(template, |caps: &Captures| {
        if data.get(&caps[1]).is_some_and(is_truthy) {
            caps[2].to_string()
        } else {
            String::new()
        }
    });

    EACH_OR_VARIABLE
        .replace_all(&kept, |caps: &Captures| match caps.get(3) {
            Some(name) => lookup(data, name.as_str()),
            None => expand_each(&caps[2], data.get(&caps[1]), data),
        })
        .into_owned()
}

/// Repeat `body` once per array element, with `{{this}}` bound to the element.
fn expand_each(body: &str, value: Option<&Value>, data: &TemplateData) -> String {
    let Some(Value::Array(items)) = value else {
        return String::new();
    };

    items
        .iter()
        .map(|item| {
            VARIABLE
                .replace_all(body, |caps: &Captures| match &caps[1] {
                    "this" => value_to_string(item),
                    name => lookup(data, name),
                })
                .into_owned()
        })
        .collect()
}

fn lookup(data: &TemplateData, name: &str) -> String {
    data.get(name).map(value_to_string).unwrap_or_default()
}

/// Truthiness used by `{{#if}}`.
///
/// Non-empty strings, non-zero numbers, non-empty arrays and objects, and
/// `true` are truthy. `null` is not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// String form of a value when substituted into text.
///
/// Arrays and objects render as compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => value.to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
