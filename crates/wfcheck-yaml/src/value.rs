use std::fmt;

use serde::{Deserialize, Deserializer};

/// A parsed YAML node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// A mapping key. YAML allows non-string keys, and some parsers turn a bare
/// `on` into `true`, so booleans are kept distinct from strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    String(String),
    Bool(bool),
    Integer(i64),
    Other(String),
}

/// Insertion-ordered mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(Key, Value)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
}

// --- Key ---

impl Key {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            _ => None,
        }
    }

    /// The key a scalar value would occupy in a mapping, if it can be one.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::String(s) => Some(Key::String(s.clone())),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Integer(i) => Some(Key::Integer(*i)),
            _ => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_owned())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::String(s) | Key::Other(s) => f.write_str(s),
            Key::Bool(b) => write!(f, "{b}"),
            Key::Integer(i) => write!(f, "{i}"),
        }
    }
}

// --- Mapping ---

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry, keeping the original position on overwrite.
    pub fn insert(&mut self, key: Key, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get_key(&self, key: &Key) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Key, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// --- Value accessors ---

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Look up a string key. `None` when absent or when `self` is not a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// String-valued field of a mapping.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Membership: key presence for mappings, element equality for sequences.
    /// Scalars contain nothing.
    pub fn contains(&self, item: &Value) -> bool {
        match self {
            Value::Mapping(m) => Key::from_value(item).is_some_and(|k| m.get_key(&k).is_some()),
            Value::Sequence(seq) => seq.contains(item),
            _ => false,
        }
    }

    /// Number of entries for collections, `0` for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::Mapping(m) => m.len(),
            Value::Sequence(s) => s.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render a scalar the way it would appear unquoted in YAML.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Sequence(seq) => {
                f.write_str("[")?;
                for (i, item) in seq.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Mapping(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// --- Construction ---

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

// --- Bridging to serde_yaml_ng ---

impl From<serde_yaml_ng::Value> for Value {
    fn from(raw: serde_yaml_ng::Value) -> Self {
        use serde_yaml_ng::Value as Y;
        match raw {
            Y::Null => Value::Null,
            Y::Bool(b) => Value::Bool(b),
            Y::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Y::String(s) => Value::String(s),
            Y::Sequence(seq) => Value::Sequence(seq.into_iter().map(Value::from).collect()),
            Y::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (Key::from(k), Value::from(v)))
                    .collect(),
            ),
            // Tags like `!reference` carry no meaning for the rules.
            Y::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

impl From<serde_yaml_ng::Value> for Key {
    fn from(raw: serde_yaml_ng::Value) -> Self {
        use serde_yaml_ng::Value as Y;
        match raw {
            Y::String(s) => Key::String(s),
            Y::Bool(b) => Key::Bool(b),
            Y::Number(n) => match n.as_i64() {
                Some(i) => Key::Integer(i),
                None => Key::Other(n.to_string()),
            },
            Y::Null => Key::Other("null".into()),
            other => Key::Other(
                serde_yaml_ng::to_string(&other)
                    .map(|s| s.trim_end().to_owned())
                    .unwrap_or_default(),
            ),
        }
    }
}

impl From<&Key> for serde_yaml_ng::Value {
    fn from(key: &Key) -> Self {
        use serde_yaml_ng::Value as Y;
        match key {
            Key::String(s) | Key::Other(s) => Y::String(s.clone()),
            Key::Bool(b) => Y::Bool(*b),
            Key::Integer(i) => Y::Number((*i).into()),
        }
    }
}

impl From<&Value> for serde_yaml_ng::Value {
    fn from(value: &Value) -> Self {
        use serde_yaml_ng::Value as Y;
        match value {
            Value::Null => Y::Null,
            Value::Bool(b) => Y::Bool(*b),
            Value::Integer(i) => Y::Number((*i).into()),
            Value::Float(x) => Y::Number((*x).into()),
            Value::String(s) => Y::String(s.clone()),
            Value::Sequence(seq) => Y::Sequence(seq.iter().map(Y::from).collect()),
            Value::Mapping(map) => {
                let mut out = serde_yaml_ng::Mapping::new();
                for (k, v) in map.iter() {
                    out.insert(Y::from(k), Y::from(v));
                }
                Y::Mapping(out)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_yaml_ng::Value::deserialize(deserializer).map(Value::from)
    }
}
