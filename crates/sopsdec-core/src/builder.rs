//! Output tree assembly
//!
//! The builder owns the tree under construction. It is seeded with the
//! container skeleton of the input document so key order and empty
//! containers survive, then receives one decrypted leaf per path.

use crate::error::{SopsError, SopsResult};
use crate::path::{Segment, TreePath};
use crate::value::{Map, Value};

#[derive(Debug, Default)]
pub struct TreeBuilder {
    root: Value,
}

impl TreeBuilder {
    /// Start from an empty tree (`Null` root).
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the container structure of `template`, with every leaf set to
    /// `Null`. A top-level object key equal to `skip_top_level` is dropped.
    pub fn with_shape_of(template: &Value, skip_top_level: Option<&str>) -> Self {
        let root = match template {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| Some(key.as_str()) != skip_top_level)
                    .map(|(key, child)| (key.clone(), skeleton(child)))
                    .collect(),
            ),
            other => skeleton(other),
        };
        Self { root }
    }

    /// Place `value` at `path`, creating containers the skeleton lacks.
    /// An array may only grow by one element at a time.
    pub fn insert(&mut self, path: &TreePath, value: Value) -> SopsResult<()> {
        let invalid = || SopsError::InvalidPath {
            path: path.to_string(),
        };

        let mut node = &mut self.root;
        for segment in path.segments() {
            node = match segment {
                Segment::Key(key) => {
                    if node.is_null() {
                        *node = Value::Object(Map::new());
                    }
                    match node {
                        Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                        _ => return Err(invalid()),
                    }
                }
                Segment::Index(index) => {
                    if node.is_null() {
                        *node = Value::Array(Vec::new());
                    }
                    match node {
                        Value::Array(items) => {
                            if *index == items.len() {
                                items.push(Value::Null);
                            }
                            items.get_mut(*index).ok_or_else(invalid)?
                        }
                        _ => return Err(invalid()),
                    }
                }
            };
        }

        if !node.is_leaf() {
            return Err(invalid());
        }
        *node = value;
        Ok(())
    }

    pub fn finish(self) -> Value {
        self.root
    }
}

/// Containers are copied without their leaves. Iterative so that depth is
/// bounded only by heap.
fn skeleton(template: &Value) -> Value {
    enum Step<'a> {
        Visit(&'a Value),
        CloseArray(usize),
        CloseObject(Vec<&'a String>),
    }

    let mut steps = vec![Step::Visit(template)];
    let mut built: Vec<Value> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Visit(Value::Array(items)) => {
                steps.push(Step::CloseArray(items.len()));
                steps.extend(items.iter().rev().map(Step::Visit));
            }
            Step::Visit(Value::Object(map)) => {
                steps.push(Step::CloseObject(map.keys().collect()));
                steps.extend(map.values().rev().map(Step::Visit));
            }
            Step::Visit(_) => built.push(Value::Null),
            Step::CloseArray(len) => {
                let items = built.split_off(built.len() - len);
                built.push(Value::Array(items));
            }
            Step::CloseObject(keys) => {
                let values = built.split_off(built.len() - keys.len());
                built.push(Value::Object(keys.into_iter().cloned().zip(values).collect()));
            }
        }
    }

    built.pop().unwrap_or_default()
}
