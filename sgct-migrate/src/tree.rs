//! The untyped document tree the migration rules operate on.
//!
//! A permissive XML parse wraps every element and attribute in a sequence of
//! exactly one entry, whatever its logical cardinality. [`Tree`] keeps that
//! artifact visible as its own variant ([`Tree::Wrapped`]) so the coercion
//! functions can tell "a wrapped value" apart from "a real list".

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::ShapeErrorKind;

/// Ordered mapping; keys keep their insertion order.
pub type Map = IndexMap<String, Tree>;

/// Leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// A node of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Scalar(Scalar),
    /// A sequence holding exactly one element.
    Wrapped(Box<Tree>),
    Map(Map),
    /// A sequence of any length other than the wrapped singleton form.
    Seq(Vec<Tree>),
}

impl Default for Tree {
    fn default() -> Self {
        Tree::Scalar(Scalar::Null)
    }
}

impl Scalar {
    /// Render the scalar as text.
    pub fn render(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }

    /// Interpret the scalar as a finite number.
    pub fn to_number(&self) -> Result<f64, ShapeErrorKind> {
        let parsed = match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::String(s) => s.trim().parse::<f64>().ok(),
            Scalar::Null | Scalar::Bool(_) => None,
        };
        parsed
            .filter(|f| f.is_finite())
            .ok_or_else(|| ShapeErrorKind::NotANumber(self.render()))
    }

    /// Only the literal text `true` (or a boolean `true`) is truthy.
    pub fn is_true(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::String(s) => s == "true",
            _ => false,
        }
    }
}

/// Convert a float into a JSON number, keeping integral values integral.
pub fn json_number(value: f64) -> Number {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_SAFE {
        Number::from(value as i64)
    } else {
        Number::from_f64(value).unwrap_or(Number::from(0))
    }
}

/// Rewrite every float in `value` through [`json_number`].
///
/// Typed models serialize `f64` fields as `1920.0`; this brings them in line
/// with the migrated output.
pub fn integral_numbers(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(f) = n.as_f64() {
                *n = json_number(f);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(integral_numbers),
        Value::Object(fields) => fields.values_mut().for_each(integral_numbers),
        _ => {}
    }
}

impl Tree {
    pub fn string(s: impl Into<String>) -> Self {
        Tree::Scalar(Scalar::String(s.into()))
    }

    pub fn number(value: f64) -> Self {
        Tree::Scalar(Scalar::Number(json_number(value)))
    }

    pub fn bool(value: bool) -> Self {
        Tree::Scalar(Scalar::Bool(value))
    }

    /// Wrap `inner` the way the XML parser wraps every value.
    pub fn wrap(inner: Tree) -> Self {
        Tree::Wrapped(Box::new(inner))
    }

    /// Short description of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Tree::Scalar(Scalar::Null) => "null",
            Tree::Scalar(Scalar::Bool(_)) => "boolean",
            Tree::Scalar(Scalar::Number(_)) => "number",
            Tree::Scalar(Scalar::String(_)) => "string",
            Tree::Wrapped(_) => "single-element sequence",
            Tree::Map(_) => "mapping",
            Tree::Seq(_) => "sequence",
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Tree::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Tree::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Tree> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// The single element of a wrapped value.
    pub fn singleton(&self) -> Result<&Tree, ShapeErrorKind> {
        match self {
            Tree::Wrapped(inner) => Ok(inner),
            Tree::Seq(items) if items.len() == 1 => Ok(&items[0]),
            Tree::Seq(items) => Err(ShapeErrorKind::WrongLength(items.len())),
            other => Err(ShapeErrorKind::NotWrapped(other.kind_name())),
        }
    }

    /// Owned counterpart of [`Tree::singleton`].
    pub fn into_singleton(self) -> Result<Tree, ShapeErrorKind> {
        match self {
            Tree::Wrapped(inner) => Ok(*inner),
            Tree::Seq(mut items) if items.len() == 1 => Ok(items.remove(0)),
            Tree::Seq(items) => Err(ShapeErrorKind::WrongLength(items.len())),
            other => Err(ShapeErrorKind::NotWrapped(other.kind_name())),
        }
    }

    /// Elements of a sequence, treating a wrapped value as a list of one.
    pub fn items(&self) -> Option<&[Tree]> {
        match self {
            Tree::Wrapped(inner) => Some(std::slice::from_ref(inner.as_ref())),
            Tree::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut [Tree]> {
        match self {
            Tree::Wrapped(inner) => Some(std::slice::from_mut(inner.as_mut())),
            Tree::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// A scalar, either bare or wrapped once.
    pub fn leaf(&self) -> Option<&Scalar> {
        match self {
            Tree::Scalar(s) => Some(s),
            Tree::Wrapped(inner) => match inner.as_ref() {
                Tree::Scalar(s) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text content of a bare or wrapped scalar.
    pub fn text(&self) -> Option<String> {
        self.leaf().map(Scalar::render)
    }
}

impl From<Value> for Tree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Tree::Scalar(Scalar::Null),
            Value::Bool(b) => Tree::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Tree::Scalar(Scalar::Number(n)),
            Value::String(s) => Tree::Scalar(Scalar::String(s)),
            Value::Array(mut items) => {
                if items.len() == 1 {
                    Tree::wrap(Tree::from(items.remove(0)))
                } else {
                    Tree::Seq(items.into_iter().map(Tree::from).collect())
                }
            }
            Value::Object(map) => {
                Tree::Map(map.into_iter().map(|(k, v)| (k, Tree::from(v))).collect())
            }
        }
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        match tree {
            Tree::Scalar(Scalar::Null) => Value::Null,
            Tree::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            Tree::Scalar(Scalar::Number(n)) => Value::Number(n),
            Tree::Scalar(Scalar::String(s)) => Value::String(s),
            Tree::Wrapped(inner) => Value::Array(vec![Value::from(*inner)]),
            Tree::Seq(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Tree::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_element_array_becomes_wrapped() {
        let tree = Tree::from(json!({ "k": ["1"], "l": ["a", "b"], "m": [] }));
        let map = tree.as_map().unwrap();
        assert!(matches!(map["k"], Tree::Wrapped(_)));
        assert!(matches!(&map["l"], Tree::Seq(items) if items.len() == 2));
        assert!(matches!(&map["m"], Tree::Seq(items) if items.is_empty()));
    }

    #[test]
    fn test_value_conversion_keeps_key_order() {
        let doc = json!({ "z": 1, "a": [{ "y": "2" }], "m": [true, false] });
        let back = Value::from(Tree::from(doc.clone()));
        assert_eq!(back, doc);
        let keys: Vec<_> = back.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_singleton_shapes() {
        assert_eq!(
            Tree::wrap(Tree::string("x")).singleton(),
            Ok(&Tree::string("x"))
        );
        assert_eq!(
            Tree::Seq(vec![]).singleton(),
            Err(ShapeErrorKind::WrongLength(0))
        );
        assert_eq!(
            Tree::string("x").singleton(),
            Err(ShapeErrorKind::NotWrapped("string"))
        );
    }

    #[test]
    fn test_scalar_numbers() {
        assert_eq!(Scalar::String(" 2.5 ".into()).to_number(), Ok(2.5));
        assert_eq!(Scalar::Number(Number::from(3)).to_number(), Ok(3.0));
        assert_eq!(
            Scalar::String("abc".into()).to_number(),
            Err(ShapeErrorKind::NotANumber("abc".into()))
        );
        assert!(Scalar::String("NaN".into()).to_number().is_err());
        assert!(Scalar::Bool(true).to_number().is_err());
    }

    #[test]
    fn test_json_number_keeps_integers_integral() {
        assert_eq!(Value::Number(json_number(20403.0)).to_string(), "20403");
        assert_eq!(Value::Number(json_number(-1.0)).to_string(), "-1");
        assert_eq!(Value::Number(json_number(0.065)).to_string(), "0.065");
    }

    #[test]
    fn test_integral_numbers_rewrites_nested_floats() {
        let mut value = json!({ "size": { "x": 1920.0, "y": 0.5 }, "list": [40.0, -2.0, 7] });
        integral_numbers(&mut value);
        assert_eq!(
            value.to_string(),
            r#"{"size":{"x":1920,"y":0.5},"list":[40,-2,7]}"#
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(Scalar::String("true".into()).is_true());
        assert!(!Scalar::String("True".into()).is_true());
        assert!(!Scalar::String("1".into()).is_true());
        assert!(Scalar::Bool(true).is_true());
    }

    #[test]
    fn test_leaf_and_items() {
        let wrapped = Tree::wrap(Tree::string("7"));
        assert_eq!(wrapped.text().as_deref(), Some("7"));
        assert_eq!(wrapped.items().map(<[Tree]>::len), Some(1));
        assert_eq!(Tree::Map(Map::new()).leaf(), None);
    }
}
