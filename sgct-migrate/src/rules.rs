//! Declarative rule tables and the walker that interprets them.
//!
//! A rule table is an ordered list of [`Rule`]s applied to one mapping.
//! Nested mappings and sequences get their own tables through
//! [`Rule::Object`] and [`Rule::Each`], so the layout of a table mirrors
//! the layout of the document it rewrites.

use crate::{
    coerce::{self, Coercion},
    error::{Result, ShapeError, ShapeErrorKind},
    tree::{Map, Tree},
};

/// Signature of a hand-written step; receives the mapping and its path.
pub type Step = fn(&mut Map, &str) -> Result<()>;

/// One entry of a rule table.
#[derive(Clone, Copy)]
pub enum Rule {
    /// Move a field to a new key.
    Rename(&'static str, &'static str),
    /// Convert a wrapped field.
    Coerce(&'static str, Coercion),
    /// Coerce the sibling `transpose` flag, then flatten the matrix at the key.
    Matrix(&'static str),
    /// Replace a wrapped mapping by one of its fields.
    Lift(&'static str, &'static str),
    /// Split a string field into a list.
    Split(&'static str, char),
    /// Drop a field.
    Remove(&'static str),
    /// Unwrap a field into a mapping and apply the nested table to it.
    Object(&'static str, &'static [Rule]),
    /// Apply the nested table to every mapping of a sequence.
    Each(&'static str, &'static [Rule]),
    /// Convert every field of the current mapping.
    EveryField(Coercion),
    /// Splice another table in place.
    Include(&'static [Rule]),
    /// Run a hand-written step.
    Apply(Step),
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Rename(old, new) => write!(f, "Rename({old} -> {new})"),
            Rule::Coerce(key, c) => write!(f, "Coerce({key}: {c:?})"),
            Rule::Matrix(key) => write!(f, "Matrix({key})"),
            Rule::Lift(key, field) => write!(f, "Lift({key}.{field})"),
            Rule::Split(key, sep) => write!(f, "Split({key} by {sep:?})"),
            Rule::Remove(key) => write!(f, "Remove({key})"),
            Rule::Object(key, rules) => write!(f, "Object({key}, {} rules)", rules.len()),
            Rule::Each(key, rules) => write!(f, "Each({key}, {} rules)", rules.len()),
            Rule::EveryField(c) => write!(f, "EveryField({c:?})"),
            Rule::Include(rules) => write!(f, "Include({} rules)", rules.len()),
            Rule::Apply(_) => write!(f, "Apply"),
        }
    }
}

/// Joins a parent path and a key.
pub fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Applies `rules` in order to `map`, located at `path`.
///
/// # Errors
///
/// The first failing rule aborts the walk.
pub fn apply(rules: &[Rule], map: &mut Map, path: &str) -> Result<()> {
    let at = |e: ShapeError| e.within(path);
    for rule in rules {
        match *rule {
            Rule::Rename(old, new) => coerce::rename(map, old, new),
            Rule::Coerce(key, coercion) => coercion.apply(map, key).map_err(at)?,
            Rule::Matrix(key) => {
                if map.contains_key(key) {
                    let order = coerce::transpose_flag(map).map_err(at)?;
                    coerce::to_mat4(map, key, order).map_err(at)?;
                }
            }
            Rule::Lift(key, field) => coerce::lift(map, key, field).map_err(at)?,
            Rule::Split(key, separator) => coerce::split(map, key, separator).map_err(at)?,
            Rule::Remove(key) => coerce::remove(map, key),
            Rule::Object(key, nested) => {
                coerce::to_object(map, key).map_err(at)?;
                if let Some(child) = map.get_mut(key) {
                    let child_path = join(path, key);
                    let child = mapping(child, &child_path)?;
                    apply(nested, child, &child_path)?;
                }
            }
            Rule::Each(key, nested) => {
                if let Some(seq) = map.get_mut(key) {
                    let seq_path = join(path, key);
                    let found = seq.kind_name();
                    let items = seq.items_mut().ok_or_else(|| {
                        ShapeError::new(&seq_path, ShapeErrorKind::NotASequence(found))
                    })?;
                    for (i, item) in items.iter_mut().enumerate() {
                        let item_path = format!("{seq_path}[{i}]");
                        let item = mapping(item, &item_path)?;
                        apply(nested, item, &item_path)?;
                    }
                }
            }
            Rule::EveryField(coercion) => coerce::every_field(map, coercion).map_err(at)?,
            Rule::Include(nested) => apply(nested, map, path)?,
            Rule::Apply(step) => step(map, path)?,
        }
    }
    Ok(())
}

/// Views `tree` as a mapping or reports where it was not one.
pub(crate) fn mapping<'t>(tree: &'t mut Tree, path: &str) -> Result<&'t mut Map, ShapeError> {
    let found = tree.kind_name();
    tree.as_map_mut()
        .ok_or_else(|| ShapeError::new(path, ShapeErrorKind::NotAMapping(found)))
}
