use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A book record as stored in the document.
///
/// The record is the raw JSON object: nothing is validated and every field,
/// including `null` values and unknown keys, is written back as it came in.
/// `id`, `title` and `author` are read through accessors.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Book {
    fields: Map<String, Value>,
}

impl Book {
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String(id.into()));
        fields.insert("title".into(), Value::String(title.into()));
        fields.insert("author".into(), Value::String(author.into()));
        Self { fields }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }

    pub fn title(&self) -> Option<&Value> {
        self.get("title")
    }

    pub fn author(&self) -> Option<&Value> {
        self.get("author")
    }

    /// Text form of the id used in logs and conflict messages.
    pub fn id_label(&self) -> Option<String> {
        match self.id() {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// On-disk shape: `{ "books": [ ... ] }`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BooksDocument {
    #[serde(default)]
    pub books: Vec<Book>,
}

/// Borrowed counterpart of [`BooksDocument`] used when writing.
#[derive(Serialize)]
pub(crate) struct BooksDocumentRef<'a> {
    pub books: &'a [Book],
}

/// How a path id is compared against stored ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdMatch {
    /// JavaScript `==` against a string: numbers and booleans compare
    /// numerically, arrays and objects compare by their string form
    /// (`[1]` matches `"1"`, any object matches `"[object Object]"`).
    #[default]
    Loose,
    /// Only string ids equal to the path segment match.
    Strict,
}

impl IdMatch {
    pub fn matches(self, stored: Option<&Value>, wanted: &str) -> bool {
        let Some(stored) = stored else { return false };
        match (self, stored) {
            (_, Value::String(s)) => s == wanted,
            (IdMatch::Strict, _) => false,
            (IdMatch::Loose, Value::Number(n)) => match (n.as_f64(), loose_number(wanted)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            (IdMatch::Loose, Value::Bool(b)) => {
                loose_number(wanted) == Some(if *b { 1.0 } else { 0.0 })
            }
            (IdMatch::Loose, Value::Array(_) | Value::Object(_)) => {
                primitive_text(stored) == wanted
            }
            (IdMatch::Loose, Value::Null) => false,
        }
    }

    /// Whether `candidate` would collide with an id already present.
    pub(crate) fn collides(self, existing: Option<&Value>, candidate: &Value) -> bool {
        match candidate {
            Value::String(s) => self.matches(existing, s),
            Value::Null => false,
            other => existing == Some(other),
        }
    }
}

/// Numeric reading of a path segment: surrounding whitespace is ignored, a
/// blank segment reads as zero and `0x`/`0o`/`0b` prefixes select the radix.
/// Non-finite results never match.
fn loose_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let prefixed = trimmed.get(..2).map(str::to_ascii_lowercase);
    let radix = match prefixed.as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix).ok().map(|n| n as f64);
    }
    // rust accepts "inf"/"nan" spellings that never read as numbers here
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// String form of a JSON value the way `String(value)` renders it in JavaScript.
fn primitive_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(primitive_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
