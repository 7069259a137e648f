//! Structural diff: field/array level patches between two JSON values.
//!
//! [`diff`] produces a [`Patch`] such that [`apply`]ing it to the old value
//! reproduces the new one; a changelog consumer can therefore replay history
//! forward from any recorded value. Object fields diff by key; arrays diff
//! index-wise, with removals ordered from the back so application never
//! shifts an index it still needs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One step in the path to a patched value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Object field name.
    Key(String),
    /// Array index.
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single field- or element-level operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Sets the value at `path`, inserting it if absent. An array index equal
    /// to the current length appends.
    Set {
        /// Location of the value to set.
        path: Vec<Segment>,
        /// The new value.
        value: Value,
    },
    /// Removes the value at `path`.
    Remove {
        /// Location of the value to remove.
        path: Vec<Segment>,
    },
}

/// An ordered sequence of operations transforming one value into another.
pub type Patch = Vec<PatchOp>;

/// Computes the patch that turns `old` into `new`.
///
/// An empty patch means the values are equal. Values of differing shapes
/// (object vs. array vs. scalar) are replaced wholesale.
#[must_use]
pub fn diff(old: &Value, new: &Value) -> Patch {
    let mut patch = Vec::new();
    diff_at(&mut Vec::new(), old, new, &mut patch);
    patch
}

fn diff_at(path: &mut Vec<Segment>, old: &Value, new: &Value, out: &mut Patch) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, new_value) in b {
                match a.get(key) {
                    Some(old_value) if old_value == new_value => {}
                    Some(old_value) => {
                        path.push(Segment::Key(key.clone()));
                        diff_at(path, old_value, new_value, out);
                        path.pop();
                    }
                    None => {
                        let mut at = path.clone();
                        at.push(Segment::Key(key.clone()));
                        out.push(PatchOp::Set {
                            path: at,
                            value: new_value.clone(),
                        });
                    }
                }
            }
            for key in a.keys().filter(|key| !b.contains_key(*key)) {
                let mut at = path.clone();
                at.push(Segment::Key(key.clone()));
                out.push(PatchOp::Remove { path: at });
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            let shared = a.len().min(b.len());
            for index in 0..shared {
                if a[index] != b[index] {
                    path.push(Segment::Index(index));
                    diff_at(path, &a[index], &b[index], out);
                    path.pop();
                }
            }
            for (index, new_value) in b.iter().enumerate().skip(shared) {
                let mut at = path.clone();
                at.push(Segment::Index(index));
                out.push(PatchOp::Set {
                    path: at,
                    value: new_value.clone(),
                });
            }
            // Back to front so each removal leaves earlier indices stable.
            for index in (shared..a.len()).rev() {
                let mut at = path.clone();
                at.push(Segment::Index(index));
                out.push(PatchOp::Remove { path: at });
            }
        }
        _ if old == new => {}
        _ => out.push(PatchOp::Set {
            path: path.clone(),
            value: new.clone(),
        }),
    }
}

/// Applies `patch` to `base`, returning the patched value.
///
/// # Errors
///
/// [`Error::Diff`] when a path does not resolve in the value being patched.
pub fn apply(patch: &[PatchOp], base: &Value) -> Result<Value> {
    let mut value = base.clone();
    for op in patch {
        match op {
            PatchOp::Set { path, value: new } => set_at(&mut value, path, new.clone())?,
            PatchOp::Remove { path } => remove_at(&mut value, path)?,
        }
    }
    Ok(value)
}

fn fail(path: &[Segment]) -> Error {
    Error::Diff {
        reason: format!("path {path:?} does not resolve"),
    }
}

fn descend<'v>(value: &'v mut Value, path: &[Segment]) -> Result<&'v mut Value> {
    let mut cursor = value;
    for segment in path {
        cursor = match (segment, cursor) {
            (Segment::Key(key), Value::Object(map)) => {
                map.get_mut(key).ok_or_else(|| fail(path))?
            }
            (Segment::Index(index), Value::Array(items)) => {
                items.get_mut(*index).ok_or_else(|| fail(path))?
            }
            _ => return Err(fail(path)),
        };
    }
    Ok(cursor)
}

fn set_at(value: &mut Value, path: &[Segment], new: Value) -> Result<()> {
    let Some((last, parent_path)) = path.split_last() else {
        *value = new;
        return Ok(());
    };
    let parent = descend(value, parent_path)?;
    match (last, parent) {
        (Segment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), new);
            Ok(())
        }
        (Segment::Index(index), Value::Array(items)) => {
            if *index < items.len() {
                items[*index] = new;
            } else if *index == items.len() {
                items.push(new);
            } else {
                return Err(fail(path));
            }
            Ok(())
        }
        _ => Err(fail(path)),
    }
}

fn remove_at(value: &mut Value, path: &[Segment]) -> Result<()> {
    let Some((last, parent_path)) = path.split_last() else {
        return Err(fail(path));
    };
    let parent = descend(value, parent_path)?;
    match (last, parent) {
        (Segment::Key(key), Value::Object(map)) => {
            map.remove(key).ok_or_else(|| fail(path))?;
            Ok(())
        }
        (Segment::Index(index), Value::Array(items)) => {
            if *index >= items.len() {
                return Err(fail(path));
            }
            items.remove(*index);
            Ok(())
        }
        _ => Err(fail(path)),
    }
}
