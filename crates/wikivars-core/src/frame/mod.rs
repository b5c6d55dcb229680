//! Scope frames for nested template expansion
//!
//! A render owns one [`FrameTree`]. The page being rendered is the root frame
//! (depth 0); each template invocation pushes a child frame holding the
//! invocation's positional and named arguments.
//!
//! ## Ownership
//!
//! Frames live in an arena and point at their parent by [`FrameId`]. A child
//! can only be attached to a frame that already exists, so the parent chain
//! always strictly decreases in depth and ends at the root.
//!
//! ## Caches
//!
//! Every binding has a node (what the host handed us) and optionally a cached
//! text (the node's expansion). The cache is a projection of the node: writes
//! through the resolver update both, and reads fall back to expanding the
//! node when no cache entry exists yet.

mod node;


pub use node::{is_digits, ArgKey, ArgNode, ArgValue, Expander, NodeRef, Verbatim};

use crate::error::{Result, VarsError};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Index of a frame inside its [`FrameTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One template invocation scope
#[derive(Debug)]
pub struct ScopeFrame {
    pub(crate) depth: usize,
    pub(crate) parent: Option<FrameId>,
    pub(crate) title: String,
    pub(crate) numbered_args: BTreeMap<u32, NodeRef>,
    pub(crate) named_args: IndexMap<String, NodeRef>,
    pub(crate) numbered_cache: BTreeMap<u32, String>,
    pub(crate) named_cache: IndexMap<String, String>,
}

impl ScopeFrame {
    fn new(depth: usize, parent: Option<FrameId>, title: String) -> Self {
        Self {
            depth,
            parent,
            title,
            numbered_args: BTreeMap::new(),
            named_args: IndexMap::new(),
            numbered_cache: BTreeMap::new(),
            named_cache: IndexMap::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }

    /// Title of the page or template this frame expands
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn numbered_args(&self) -> &BTreeMap<u32, NodeRef> {
        &self.numbered_args
    }

    pub fn named_args(&self) -> &IndexMap<String, NodeRef> {
        &self.named_args
    }

    /// Node bound at `key`, if any
    pub fn node(&self, key: &ArgKey) -> Option<&NodeRef> {
        match key {
            ArgKey::Numbered(i) => self.numbered_args.get(i),
            ArgKey::Named(k) => self.named_args.get(k),
        }
    }

    pub(crate) fn cached(&self, key: &ArgKey) -> Option<&str> {
        match key {
            ArgKey::Numbered(i) => self.numbered_cache.get(i).map(String::as_str),
            ArgKey::Named(k) => self.named_cache.get(k).map(String::as_str),
        }
    }

    /// Bind `node` at `key`, writing the cache alongside.
    ///
    /// An existing node is overwritten in place so that its identity survives.
    pub(crate) fn bind(&mut self, key: ArgKey, node: ArgNode, text: String) {
        match key {
            ArgKey::Numbered(i) => {
                match self.numbered_args.get(&i) {
                    Some(existing) => *existing.borrow_mut() = node,
                    None => {
                        self.numbered_args.insert(i, Rc::new(RefCell::new(node)));
                    }
                }
                self.numbered_cache.insert(i, text);
            }
            ArgKey::Named(k) => {
                match self.named_args.get(&k) {
                    Some(existing) => *existing.borrow_mut() = node,
                    None => {
                        self.named_args.insert(k.clone(), Rc::new(RefCell::new(node)));
                    }
                }
                self.named_cache.insert(k, text);
            }
        }
    }

    /// Drop the binding at `key` together with its cache entry
    pub(crate) fn remove(&mut self, key: &ArgKey) -> bool {
        match key {
            ArgKey::Numbered(i) => {
                self.numbered_cache.remove(i);
                self.numbered_args.remove(i).is_some()
            }
            ArgKey::Named(k) => {
                self.named_cache.shift_remove(k);
                self.named_args.shift_remove(k).is_some()
            }
        }
    }
}

/// Arguments a host passes when it opens a template frame
#[derive(Debug, Clone, Default)]
pub struct FrameArgs {
    positional: Vec<ArgNode>,
    named: Vec<(String, ArgNode)>,
}

impl FrameArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unnamed argument; unnamed arguments are numbered from 1
    pub fn positional(mut self, node: impl Into<ArgNode>) -> Self {
        self.positional.push(node.into());
        self
    }

    /// Add a named argument, kept under its literal key even when that key
    /// is a digit string (`{{T|2=b}}`)
    pub fn named(mut self, key: impl Into<String>, node: impl Into<ArgNode>) -> Self {
        self.named.push((key.into(), node.into()));
        self
    }
}

impl From<&str> for ArgNode {
    fn from(s: &str) -> Self {
        ArgNode::Text(s.to_string())
    }
}

impl From<String> for ArgNode {
    fn from(s: String) -> Self {
        ArgNode::Text(s)
    }
}

/// Arena of frames for one render
pub struct FrameTree {
    frames: Vec<ScopeFrame>,
    expander: Box<dyn Expander>,
}

impl fmt::Debug for FrameTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTree")
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl FrameTree {
    /// Create a tree whose root frame renders `title`; markup is not expanded
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_expander(title, Verbatim)
    }

    /// Create a tree using the host's expander for markup nodes
    pub fn with_expander(title: impl Into<String>, expander: impl Expander + 'static) -> Self {
        Self {
            frames: vec![ScopeFrame::new(0, None, title.into())],
            expander: Box::new(expander),
        }
    }

    pub fn root(&self) -> FrameId {
        FrameId(0)
    }

    /// Open a template frame beneath `parent`
    pub fn push_child(
        &mut self,
        parent: FrameId,
        title: impl Into<String>,
        args: FrameArgs,
    ) -> Result<FrameId> {
        let depth = self
            .frame(parent)
            .map(|p| p.depth + 1)
            .ok_or(VarsError::FrameNotFound(parent.0))?;

        let mut frame = ScopeFrame::new(depth, Some(parent), title.into());
        for (index, node) in (1u32..).zip(args.positional) {
            frame.numbered_args.insert(index, Rc::new(RefCell::new(node)));
        }
        for (key, node) in args.named {
            frame.named_args.insert(key, Rc::new(RefCell::new(node)));
        }

        let id = FrameId(self.frames.len());
        self.frames.push(frame);
        tracing::debug!(frame = id.0, depth, "opened template frame");
        Ok(id)
    }

    pub fn frame(&self, id: FrameId) -> Option<&ScopeFrame> {
        self.frames.get(id.0)
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Result<&mut ScopeFrame> {
        self.frames
            .get_mut(id.0)
            .ok_or(VarsError::FrameNotFound(id.0))
    }

    pub fn parent(&self, id: FrameId) -> Option<FrameId> {
        self.frame(id).and_then(|f| f.parent)
    }

    /// True for the frame of the page rendered directly (no invoking frame)
    pub fn is_top_level(&self, id: FrameId) -> bool {
        self.frame(id).is_some_and(|f| f.parent.is_none())
    }

    /// `id` followed by each enclosing frame up to the root
    pub fn ancestors(&self, id: FrameId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.frame(id).map(|_| id),
        }
    }

    pub fn expand(&self, node: &ArgNode) -> String {
        self.expander.expand(node)
    }

    /// Text of the binding at `key` in `id`: the cache when present,
    /// otherwise the expansion of the node.
    pub fn text(&self, id: FrameId, key: &ArgKey) -> Option<String> {
        let frame = self.frame(id)?;
        if let Some(cached) = frame.cached(key) {
            return Some(cached.to_string());
        }
        frame.node(key).map(|node| self.expand(&node.borrow()))
    }
}

/// Iterator over a frame and its ancestors
pub struct Ancestors<'a> {
    tree: &'a FrameTree,
    next: Option<FrameId>,
}

impl Iterator for Ancestors<'_> {
    type Item = FrameId;

    fn next(&mut self) -> Option<FrameId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
