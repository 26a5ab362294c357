//! Field placeholders and value coercion.
//!
//! Scripts refer to the row's fields as `$<table>_<field>`. Each live field
//! is bound to a sandbox variable named `<table>_<field>` (hyphens become
//! underscores) holding the field's current value, and the `$` tokens in the
//! code are rewritten to those names. After a run the variables are read
//! back onto the row, so plain assignments are kept.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use tablekit_core::storage::Row;

/// One field variable exposed to a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Sandbox variable name
    pub name: String,
    /// Row key the variable reads from and writes back to
    pub field: String,
    /// Value at bind time; `None` binds `undefined`
    pub value: Option<Value>,
}

/// Script text with its field variables.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundScript {
    pub code: String,
    pub bindings: Vec<Binding>,
}

/// Name of the variable bound to a field.
pub fn binding_name(table_slug: &str, field_slug: &str) -> String {
    format!("{}_{}", table_slug, field_slug).replace('-', "_")
}

/// Row key addressed by a field id as scripts write it.
///
/// `$data_entrega`, `data_entrega` and `data-entrega` all address `data-entrega`.
pub fn normalize_field_id(id: &str) -> String {
    id.strip_prefix('$').unwrap_or(id).replace('_', "-")
}

/// Binds the row's fields and rewrites their `$` placeholders.
///
/// # Arguments
/// * `code` - Normalized script text
/// * `doc` - Row the script runs against
/// * `table_slug` - Slug of the row's table; empty binds nothing
/// * `field_slugs` - Slugs of the table's live fields
pub fn bind(code: &str, doc: &Row, table_slug: &str, field_slugs: &[String]) -> BoundScript {
    if table_slug.is_empty() {
        return BoundScript {
            code: code.to_string(),
            bindings: Vec::new(),
        };
    }

    let mut bindings: Vec<Binding> = field_slugs
        .iter()
        .map(|field| Binding {
            name: binding_name(table_slug, field),
            field: field.clone(),
            value: doc.get(field).cloned(),
        })
        .collect();

    // longest first so `$t_price_total` is never cut at `$t_price`
    bindings.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

    let mut code = code.to_string();
    for binding in &bindings {
        code = replace_placeholder(&code, &binding.name);
    }

    BoundScript { code, bindings }
}

/// Replaces `$name` with `name` where the token is not part of a longer name.
fn replace_placeholder(code: &str, name: &str) -> String {
    let token = format!("${}", name);
    let mut out = String::with_capacity(code.len());
    let mut rest = code;
    while let Some(pos) = rest.find(&token) {
        let after = &rest[pos + token.len()..];
        let whole = !after
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        out.push_str(&rest[..pos]);
        out.push_str(if whole { name } else { &token });
        rest = after;
    }
    out.push_str(rest);
    out
}

/// A string value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 text to be turned into a `Date`
    Date(String),
    Text(String),
}

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid integer pattern"));
static FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.\d*|\.\d+)([eE][-+]?\d+)?$").expect("valid float pattern"));
static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid date pattern")
});

/// Coerces a string written through `setFieldValue`.
///
/// Numeric text becomes a number (integers stay integers), `true`/`false`
/// in any case become booleans and ISO-8601 dates become dates. Anything
/// else is kept as written.
pub fn coerce_field_value(raw: &str) -> Coerced {
    let text = raw.trim();
    if INTEGER.is_match(text) {
        return match text.parse::<i64>() {
            Ok(n) => Coerced::Integer(n),
            Err(_) => text
                .parse::<f64>()
                .map_or_else(|_| Coerced::Text(raw.to_string()), Coerced::Float),
        };
    }
    if FLOAT.is_match(text) {
        if let Ok(n) = text.parse::<f64>() {
            return Coerced::Float(n);
        }
    }
    if text.eq_ignore_ascii_case("true") {
        return Coerced::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Coerced::Bool(false);
    }
    if ISO_DATE.is_match(text) {
        return Coerced::Date(text.to_string());
    }
    Coerced::Text(raw.to_string())
}
