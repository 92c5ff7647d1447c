//! Leaf enumeration
//!
//! The walk is depth-first and pre-order with respect to sibling order:
//! object keys in declaration order, array elements by index. The same tree
//! always yields the same sequence, which is what the document MAC is
//! computed over.

use std::fmt;
use std::iter::Enumerate;
use std::slice;

use crate::value::Value;

/// One step into a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a leaf, rendered as dot-joined segments (`a.b.0.c`).
///
/// The rendered form is the AAD each leaf is encrypted under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl From<Vec<Segment>> for TreePath {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[derive(Clone)]
enum Frame<'a> {
    Object(indexmap::map::Iter<'a, String, Value>),
    Array(Enumerate<slice::Iter<'a, Value>>),
}

/// Iterator over `(path, leaf)` pairs. Cheap to clone; each clone resumes
/// independently from the same position.
#[derive(Clone)]
pub struct Leaves<'a> {
    root: Option<&'a Value>,
    stack: Vec<Frame<'a>>,
    path: Vec<Segment>,
    skip_top_level: Option<&'a str>,
}

/// Enumerate every leaf of `tree`.
pub fn walk(tree: &Value) -> Leaves<'_> {
    Leaves {
        root: Some(tree),
        stack: Vec::new(),
        path: Vec::new(),
        skip_top_level: None,
    }
}

/// Enumerate every leaf of `tree` except those under the top-level object
/// key `reserved` (the `sops` metadata block).
pub fn walk_excluding<'a>(tree: &'a Value, reserved: &'a str) -> Leaves<'a> {
    Leaves {
        skip_top_level: Some(reserved),
        ..walk(tree)
    }
}

impl<'a> Leaves<'a> {
    /// Push a frame for containers; hand back the node itself for leaves.
    fn enter(&mut self, node: &'a Value) -> Option<&'a Value> {
        match node {
            Value::Object(map) => {
                self.stack.push(Frame::Object(map.iter()));
                None
            }
            Value::Array(items) => {
                self.stack.push(Frame::Array(items.iter().enumerate()));
                None
            }
            leaf => Some(leaf),
        }
    }

    fn current_path(&self) -> TreePath {
        TreePath::from(self.path.clone())
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (TreePath, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            if let Some(leaf) = self.enter(root) {
                return Some((TreePath::root(), leaf));
            }
        }

        loop {
            let at_top_level = self.stack.len() == 1;
            let next = match self.stack.last_mut()? {
                Frame::Object(iter) => iter
                    .next()
                    .map(|(key, child)| (Segment::Key(key.clone()), child)),
                Frame::Array(iter) => iter
                    .next()
                    .map(|(index, child)| (Segment::Index(index), child)),
            };

            let Some((segment, child)) = next else {
                // The root frame has no segment of its own; popping an empty
                // path is a no-op.
                self.stack.pop();
                self.path.pop();
                continue;
            };

            if at_top_level {
                if let (Some(reserved), Segment::Key(key)) = (self.skip_top_level, &segment) {
                    if key == reserved {
                        continue;
                    }
                }
            }

            self.path.push(segment);
            if let Some(leaf) = self.enter(child) {
                let path = self.current_path();
                self.path.pop();
                return Some((path, leaf));
            }
        }
    }
}
