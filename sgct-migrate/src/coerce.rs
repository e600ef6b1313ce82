//! Field-level coercion primitives.
//!
//! Every function takes the mapping that owns the field and the field name.
//! A missing field is never an error: the call is a no-op. A present field
//! must hold a single-element sequence (see [`Tree::Wrapped`]); anything else
//! is a [`ShapeError`]. Applying a coercion to a field that was already
//! converted therefore fails or does nothing, it never converts twice.

use crate::{
    error::{ShapeError, ShapeErrorKind},
    tree::{Map, Scalar, Tree},
};

/// Component names of a 4x4 matrix in row-major order.
const MAT4_ROW_MAJOR: [&str; 16] = [
    "x0", "x1", "x2", "x3", "y0", "y1", "y2", "y3", "z0", "z1", "z2", "z3", "w0", "w1", "w2",
    "w3",
];

/// Component names of a 4x4 matrix in column-major order.
const MAT4_COLUMN_MAJOR: [&str; 16] = [
    "x0", "y0", "z0", "w0", "x1", "y1", "z1", "w1", "x2", "y2", "z2", "w2", "x3", "y3", "z3",
    "w3",
];

/// The conversions that can be listed in a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Text,
    Number,
    Boolean,
    Vec2,
    Vec3,
    Object,
}

impl Coercion {
    /// Applies the coercion to `map[key]`.
    pub fn apply(self, map: &mut Map, key: &str) -> Result<(), ShapeError> {
        match self {
            Coercion::Text => to_string(map, key),
            Coercion::Number => to_number(map, key),
            Coercion::Boolean => to_boolean(map, key),
            Coercion::Vec2 => to_vec2(map, key),
            Coercion::Vec3 => to_vec3(map, key),
            Coercion::Object => to_object(map, key),
        }
    }
}

/// Flattening order of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOrder {
    RowMajor,
    ColumnMajor,
}

impl MatrixOrder {
    /// Component names in output order.
    pub fn components(self) -> &'static [&'static str; 16] {
        match self {
            MatrixOrder::RowMajor => &MAT4_ROW_MAJOR,
            MatrixOrder::ColumnMajor => &MAT4_COLUMN_MAJOR,
        }
    }
}

/// Moves `map[old]` to `map[new]`.
///
/// A missing `old` is a no-op. When `new` already exists its value is
/// replaced in place; otherwise the key is appended.
///
/// # Panics
///
/// Panics if `old == new`.
pub fn rename(map: &mut Map, old: &str, new: &str) {
    assert_ne!(old, new, "rename source and target must differ");
    if let Some(value) = map.shift_remove(old) {
        map.insert(new.to_string(), value);
    }
}

/// Removes `map[key]`, if present.
pub fn remove(map: &mut Map, key: &str) {
    map.shift_remove(key);
}

/// Takes the element out of the single-element sequence at `map[key]`.
///
/// Returns the emptied slot so the caller can store the converted value.
fn unwrap_slot<'a>(map: &'a mut Map, key: &str) -> Result<Option<(&'a mut Tree, Tree)>, ShapeError> {
    let Some(slot) = map.get_mut(key) else {
        return Ok(None);
    };
    let inner = std::mem::take(slot)
        .into_singleton()
        .map_err(|kind| ShapeError::new(key, kind))?;
    Ok(Some((slot, inner)))
}

fn scalar_of<'t>(tree: &'t Tree, path: &str) -> Result<&'t Scalar, ShapeError> {
    match tree {
        Tree::Scalar(s) => Ok(s),
        other => Err(ShapeError::new(
            path,
            ShapeErrorKind::NotAScalar(other.kind_name()),
        )),
    }
}

/// Reads a bare or wrapped numeric component of `map`.
pub(crate) fn component(map: &Map, name: &str, path: &str) -> Result<f64, ShapeError> {
    let field_path = format!("{path}.{name}");
    let value = map.get(name).ok_or_else(|| {
        ShapeError::new(path, ShapeErrorKind::MissingField(name.to_string()))
    })?;
    let scalar = value.leaf().ok_or_else(|| {
        ShapeError::new(&field_path, ShapeErrorKind::NotAScalar(value.kind_name()))
    })?;
    scalar
        .to_number()
        .map_err(|kind| ShapeError::new(field_path, kind))
}

fn components(inner: &Tree, names: &[&str], path: &str) -> Result<Vec<f64>, ShapeError> {
    let map = inner.as_map().ok_or_else(|| {
        ShapeError::new(path, ShapeErrorKind::NotAMapping(inner.kind_name()))
    })?;
    names.iter().map(|name| component(map, name, path)).collect()
}

/// `{"k": ["1.5"]}` → `{"k": "1.5"}`.
pub fn to_string(map: &mut Map, key: &str) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    *slot = Tree::string(scalar_of(&inner, key)?.render());
    Ok(())
}

/// `{"k": ["1.5"]}` → `{"k": 1.5}`.
pub fn to_number(map: &mut Map, key: &str) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    let value = scalar_of(&inner, key)?
        .to_number()
        .map_err(|kind| ShapeError::new(key, kind))?;
    *slot = Tree::number(value);
    Ok(())
}

/// `{"k": ["true"]}` → `{"k": true}`; any other text becomes `false`.
pub fn to_boolean(map: &mut Map, key: &str) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    *slot = Tree::bool(scalar_of(&inner, key)?.is_true());
    Ok(())
}

fn to_vector(map: &mut Map, key: &str, names: &[&str]) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    let values = components(&inner, names, key)?;
    *slot = Tree::Map(
        names
            .iter()
            .zip(values)
            .map(|(name, v)| (name.to_string(), Tree::number(v)))
            .collect(),
    );
    Ok(())
}

/// `{"k": [{"x": "1", "y": "2"}]}` → `{"k": {"x": 1, "y": 2}}`.
pub fn to_vec2(map: &mut Map, key: &str) -> Result<(), ShapeError> {
    to_vector(map, key, &["x", "y"])
}

/// `{"k": [{"x": "1", "y": "2", "z": "3"}]}` → `{"k": {"x": 1, "y": 2, "z": 3}}`.
pub fn to_vec3(map: &mut Map, key: &str) -> Result<(), ShapeError> {
    to_vector(map, key, &["x", "y", "z"])
}

/// Flattens the `x0`..`w3` components of `map[key]` into 16 numbers.
pub fn to_mat4(map: &mut Map, key: &str, order: MatrixOrder) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    let values = components(&inner, order.components(), key)?;
    *slot = Tree::Seq(values.into_iter().map(Tree::number).collect());
    Ok(())
}

/// Coerces the `transpose` flag of `map` and derives the matrix order.
///
/// `transpose == true` selects row-major order, anything else column-major.
pub fn transpose_flag(map: &mut Map) -> Result<MatrixOrder, ShapeError> {
    to_boolean(map, "transpose")?;
    let transposed = matches!(map.get("transpose"), Some(Tree::Scalar(Scalar::Bool(true))));
    Ok(if transposed {
        MatrixOrder::RowMajor
    } else {
        MatrixOrder::ColumnMajor
    })
}

/// `{"k": [{..}]}` → `{"k": {..}}` without touching the inner fields.
///
/// An element without attributes or children parses as empty text and
/// becomes an empty mapping.
pub fn to_object(map: &mut Map, key: &str) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    *slot = match inner {
        Tree::Scalar(Scalar::String(text)) if text.is_empty() => Tree::Map(Map::new()),
        inner => inner,
    };
    Ok(())
}

/// Applies `coercion` to every field of `map`.
pub fn every_field(map: &mut Map, coercion: Coercion) -> Result<(), ShapeError> {
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        coercion.apply(map, &key)?;
    }
    Ok(())
}

/// Replaces the wrapped mapping at `map[key]` by its `field` entry.
///
/// `{"scale": [{"value": ["2"]}]}` → `{"scale": ["2"]}`.
pub fn lift(map: &mut Map, key: &str, field: &str) -> Result<(), ShapeError> {
    let Some((slot, inner)) = unwrap_slot(map, key)? else {
        return Ok(());
    };
    let mut fields = match inner {
        Tree::Map(fields) => fields,
        other => {
            return Err(ShapeError::new(
                key,
                ShapeErrorKind::NotAMapping(other.kind_name()),
            ));
        }
    };
    *slot = fields.shift_remove(field).ok_or_else(|| {
        ShapeError::new(key, ShapeErrorKind::MissingField(field.to_string()))
    })?;
    Ok(())
}

/// Splits the string at `map[key]` into a sequence of strings.
pub fn split(map: &mut Map, key: &str, separator: char) -> Result<(), ShapeError> {
    let Some(slot) = map.get_mut(key) else {
        return Ok(());
    };
    let parts = match slot {
        Tree::Scalar(Scalar::String(joined)) => joined.split(separator).map(Tree::string).collect(),
        other => {
            return Err(ShapeError::new(
                key,
                ShapeErrorKind::NotAScalar(other.kind_name()),
            ));
        }
    };
    *slot = Tree::Seq(parts);
    Ok(())
}

/// Converts every field of `map` to a number, accepting bare or wrapped scalars.
pub(crate) fn numbers_in_place(map: &mut Map, path: &str) -> Result<(), ShapeError> {
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        let value = component(map, &key, path)?;
        map.insert(key, Tree::number(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn map(value: Value) -> Map {
        match Tree::from(value) {
            Tree::Map(map) => map,
            other => panic!("not a mapping: {other:?}"),
        }
    }

    fn json(map: Map) -> Value {
        Value::from(Tree::Map(map))
    }

    #[test]
    fn test_rename_moves_value() {
        let mut m = map(json!({ "a": ["1"], "b": ["2"] }));
        rename(&mut m, "a", "c");
        assert_eq!(json(m), json!({ "b": ["2"], "c": ["1"] }));
    }

    #[test]
    fn test_rename_missing_is_noop() {
        let mut m = map(json!({ "b": ["2"] }));
        rename(&mut m, "a", "c");
        assert_eq!(json(m), json!({ "b": ["2"] }));
    }

    #[test]
    fn test_rename_onto_existing_key_replaces_in_place() {
        let mut m = map(json!({ "blendmask": ["x"], "eye": ["left"], "BlendMask": ["y"] }));
        rename(&mut m, "BlendMask", "blendmask");
        assert_eq!(json(m), json!({ "blendmask": ["y"], "eye": ["left"] }));
    }

    #[test]
    #[should_panic]
    fn test_rename_same_key_panics() {
        let mut m = Map::new();
        rename(&mut m, "a", "a");
    }

    #[test]
    fn test_scalar_coercions() {
        let mut m = map(json!({ "s": [12], "n": ["1.5"], "t": ["true"], "f": ["yes"] }));
        to_string(&mut m, "s").unwrap();
        to_number(&mut m, "n").unwrap();
        to_boolean(&mut m, "t").unwrap();
        to_boolean(&mut m, "f").unwrap();
        assert_eq!(json(m), json!({ "s": "12", "n": 1.5, "t": true, "f": false }));
    }

    #[test]
    fn test_missing_key_is_noop() {
        let mut m = map(json!({ "other": ["1"] }));
        to_vec3(&mut m, "k").unwrap();
        to_number(&mut m, "k").unwrap();
        to_mat4(&mut m, "k", MatrixOrder::RowMajor).unwrap();
        assert_eq!(json(m), json!({ "other": ["1"] }));
    }

    #[test]
    fn test_to_vec3() {
        let mut m = map(json!({ "k": [{ "x": "1", "y": "2", "z": "3" }] }));
        to_vec3(&mut m, "k").unwrap();
        assert_eq!(json(m), json!({ "k": { "x": 1, "y": 2, "z": 3 } }));
    }

    #[test]
    fn test_to_vec2_accepts_wrapped_components() {
        let mut m = map(json!({ "k": [{ "x": ["0.5"], "y": ["-2"] }] }));
        to_vec2(&mut m, "k").unwrap();
        assert_eq!(json(m), json!({ "k": { "x": 0.5, "y": -2 } }));
    }

    #[test]
    fn test_wrong_length_is_fatal() {
        let mut m = map(json!({ "k": [] }));
        let err = to_vec3(&mut m, "k").unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::WrongLength(0));

        let mut m = map(json!({ "k": ["a", "b"] }));
        let err = to_string(&mut m, "k").unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::WrongLength(2));
        assert_eq!(err.path, "k");
    }

    #[test]
    fn test_unwrapped_value_is_fatal() {
        let mut m = map(json!({ "k": "1" }));
        let err = to_number(&mut m, "k").unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::NotWrapped("string"));
    }

    #[test]
    fn test_second_application_does_not_convert_again() {
        let mut m = map(json!({ "k": ["3"] }));
        to_number(&mut m, "k").unwrap();
        assert!(to_number(&mut m, "k").is_err());
    }

    #[test]
    fn test_missing_vector_component() {
        let mut m = map(json!({ "pos": [{ "x": "1" }] }));
        let err = to_vec2(&mut m, "pos").unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::MissingField("y".into()));
    }

    #[test]
    fn test_non_numeric_component() {
        let mut m = map(json!({ "pos": [{ "x": "1", "y": "up" }] }));
        let err = to_vec2(&mut m, "pos").unwrap_err();
        assert_eq!(err.path, "pos.y");
        assert_eq!(err.kind, ShapeErrorKind::NotANumber("up".into()));
    }

    fn matrix() -> Value {
        let mut fields = serde_json::Map::new();
        for (i, name) in MAT4_ROW_MAJOR.iter().enumerate() {
            fields.insert(name.to_string(), json!([(i + 1).to_string()]));
        }
        Value::Array(vec![Value::Object(fields)])
    }

    #[test]
    fn test_mat4_transposed_is_row_major() {
        let mut m = map(json!({ "transpose": ["true"], "matrix": matrix() }));
        let order = transpose_flag(&mut m).unwrap();
        assert_eq!(order, MatrixOrder::RowMajor);
        to_mat4(&mut m, "matrix", order).unwrap();
        let expected: Vec<i64> = (1..=16).collect();
        assert_eq!(json(m), json!({ "transpose": true, "matrix": expected }));
    }

    #[test]
    fn test_mat4_default_is_column_major() {
        let mut m = map(json!({ "matrix": matrix() }));
        let order = transpose_flag(&mut m).unwrap();
        assert_eq!(order, MatrixOrder::ColumnMajor);
        to_mat4(&mut m, "matrix", order).unwrap();
        assert_eq!(
            json(m),
            json!({ "matrix": [1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15, 4, 8, 12, 16] })
        );
    }

    #[test]
    fn test_to_object_unwraps_without_coercing() {
        let mut m = map(json!({ "o": [{ "a": ["1"] }] }));
        to_object(&mut m, "o").unwrap();
        assert_eq!(json(m), json!({ "o": { "a": ["1"] } }));
    }

    #[test]
    fn test_to_object_empty_element_is_empty_mapping() {
        let mut m = map(json!({ "o": [""], "p": ["text"] }));
        to_object(&mut m, "o").unwrap();
        to_object(&mut m, "p").unwrap();
        assert_eq!(json(m), json!({ "o": {}, "p": "text" }));
    }

    #[test]
    fn test_lift_and_split() {
        let mut m = map(json!({ "scale": [{ "value": ["2"] }], "tags": "a,b,c" }));
        lift(&mut m, "scale", "value").unwrap();
        to_number(&mut m, "scale").unwrap();
        split(&mut m, "tags", ',').unwrap();
        assert_eq!(json(m), json!({ "scale": 2, "tags": ["a", "b", "c"] }));
    }

    #[test]
    fn test_lift_missing_field() {
        let mut m = map(json!({ "scale": [{ "factor": ["2"] }] }));
        let err = lift(&mut m, "scale", "value").unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::MissingField("value".into()));
    }

    #[test]
    fn test_every_field() {
        let mut m = map(json!({ "yaw": ["10"], "pitch": ["-5"] }));
        every_field(&mut m, Coercion::Number).unwrap();
        assert_eq!(json(m), json!({ "yaw": 10, "pitch": -5 }));
    }
}
