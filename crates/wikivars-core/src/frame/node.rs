//! Argument nodes, binding keys and the host expansion boundary

use std::cell::RefCell;
use std::rc::Rc;

/// A template argument node as handed over by the host parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgNode {
    /// Literal text, used as-is
    Text(String),
    /// Unexpanded markup; its text comes from the host [`Expander`]
    Markup(String),
}

impl ArgNode {
    /// Source text of the node before any expansion
    pub fn raw(&self) -> &str {
        match self {
            ArgNode::Text(s) | ArgNode::Markup(s) => s,
        }
    }
}

/// Shared handle to a bound node.
///
/// Rebinding an existing key mutates the node behind this handle, so anything
/// that kept a clone observes the new value.
pub type NodeRef = Rc<RefCell<ArgNode>>;

/// Value passed to a set operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Node(ArgNode),
}

impl ArgValue {
    pub fn text(s: impl Into<String>) -> Self {
        ArgValue::Text(s.into())
    }

    pub(crate) fn into_node(self) -> ArgNode {
        match self {
            ArgValue::Text(s) => ArgNode::Text(s),
            ArgValue::Node(n) => n,
        }
    }
}

/// Storage key of a binding: positional arguments and named arguments live
/// in separate maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgKey {
    Numbered(u32),
    Named(String),
}

impl ArgKey {
    /// Route a variable name to its storage.
    ///
    /// Only canonical decimal integers ("0", "7", "12") are positional; "07"
    /// stays a named key.
    pub fn parse(name: &str) -> Self {
        if is_digits(name) && (name == "0" || !name.starts_with('0')) {
            if let Ok(index) = name.parse::<u32>() {
                return ArgKey::Numbered(index);
            }
        }
        ArgKey::Named(name.to_string())
    }
}

/// Names made only of ASCII digits never take part in case folding.
pub fn is_digits(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Host-side expansion of markup nodes into text
pub trait Expander {
    fn expand_markup(&self, markup: &str) -> String;

    fn expand(&self, node: &ArgNode) -> String {
        match node {
            ArgNode::Text(s) => s.clone(),
            ArgNode::Markup(m) => self.expand_markup(m),
        }
    }
}

impl<F> Expander for F
where
    F: Fn(&str) -> String,
{
    fn expand_markup(&self, markup: &str) -> String {
        self(markup)
    }
}

/// Expander that leaves markup untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct Verbatim;

impl Expander for Verbatim {
    fn expand_markup(&self, markup: &str) -> String {
        markup.to_string()
    }
}
