//! Parser-function verbs built on the resolver
//!
//! Each verb receives the raw arguments of a parser function call
//! (`{{#define:name|value|case=any|if=...}}`). [`VerbCall::parse`] splits
//! them into the variable name, an optional value, further names and options.
//! Conditions (`if=` / `ifnot=`) are evaluated by a predicate the host hands
//! in; the verbs only look at the outcome.

use super::{find_local, set, unset as unset_binding};
use crate::error::Result;
use crate::frame::{ArgKey, ArgNode, ArgValue, FrameId, FrameTree};

/// Options recognised after the positional arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerbOptions {
    /// `case=any`
    pub any_case: bool,
    /// Outcome of `if=`; `None` when absent
    pub if_true: Option<bool>,
    /// Outcome of `ifnot=`; `None` when absent
    pub if_not: Option<bool>,
    /// `shift=` for unset
    pub shift: bool,
    /// `savemarkup=` for save
    pub save_markup: bool,
    /// `set=` for save and load
    pub set_name: Option<String>,
}

impl VerbOptions {
    /// Whether the `if` / `ifnot` gates let the verb run
    pub fn gate_open(&self) -> bool {
        self.if_true.unwrap_or(true) && !self.if_not.unwrap_or(false)
    }
}

/// A parsed verb invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbCall {
    pub name: String,
    pub value: Option<ArgNode>,
    pub extra: Vec<String>,
    pub options: VerbOptions,
}

impl VerbCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            extra: Vec::new(),
            options: VerbOptions::default(),
        }
    }

    pub fn with_value(mut self, value: impl Into<ArgNode>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: VerbOptions) -> Self {
        self.options = options;
        self
    }

    /// Split raw parser-function arguments.
    ///
    /// `key=value` arguments whose key is a known option are options; the
    /// first remaining argument is the name, the second the value, the rest
    /// land in `extra`. `truthy` decides `if=` / `ifnot=` conditions.
    pub fn parse<I, F>(args: I, truthy: F) -> Self
    where
        I: IntoIterator<Item = ArgNode>,
        F: Fn(&str) -> bool,
    {
        let mut options = VerbOptions::default();
        let mut positional = Vec::new();

        for arg in args {
            if let Some((key, value)) = arg.raw().split_once('=') {
                let value = value.trim();
                let recognised = match key.trim() {
                    "case" => {
                        options.any_case = value.eq_ignore_ascii_case("any");
                        true
                    }
                    "if" => {
                        options.if_true = Some(truthy(value));
                        true
                    }
                    "ifnot" => {
                        options.if_not = Some(truthy(value));
                        true
                    }
                    "shift" => {
                        options.shift = truthy(value);
                        true
                    }
                    "savemarkup" => {
                        options.save_markup = truthy(value);
                        true
                    }
                    "set" => {
                        options.set_name = Some(value.to_string());
                        true
                    }
                    _ => false,
                };
                if recognised {
                    continue;
                }
            }
            positional.push(arg);
        }

        let mut positional = positional.into_iter();
        let name = positional
            .next()
            .map(|n| n.raw().trim().to_string())
            .unwrap_or_default();
        let value = positional.next();
        let extra = positional
            .map(|n| n.raw().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        Self {
            name,
            value,
            extra,
            options,
        }
    }

    /// The name plus every further name, for verbs taking a list of names
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.extra.len() + 2);
        if !self.name.is_empty() {
            names.push(self.name.clone());
        }
        if let Some(value) = &self.value {
            let second = value.raw().trim();
            if !second.is_empty() {
                names.push(second.to_string());
            }
        }
        names.extend(self.extra.iter().cloned());
        names
    }

    fn value_or_empty(&self) -> ArgValue {
        match &self.value {
            Some(node) => ArgValue::Node(node.clone()),
            None => ArgValue::Text(String::new()),
        }
    }
}

/// Default truthiness for conditions: any non-blank text
pub fn is_truthy(text: &str) -> bool {
    !text.trim().is_empty()
}

/// `#local`: always bind the value in the current frame.
///
/// With `case=any` other-case spellings of the name are dropped first so the
/// new binding is the only one.
pub fn local(tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<bool> {
    if call.name.is_empty() || !call.options.gate_open() {
        return Ok(false);
    }
    if call.options.any_case {
        unset_binding(tree, frame, &call.name, true, false)?;
    }
    set(tree, frame, &call.name, call.value_or_empty())?;
    Ok(true)
}

/// `#define`: bind the value unless the name is already bound in this frame.
///
/// When `case=any` finds the variable under another spelling, the binding is
/// moved to the requested spelling and keeps its value.
pub fn define(tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<bool> {
    if call.name.is_empty() || !call.options.gate_open() {
        return Ok(false);
    }

    match find_local(tree, frame, &call.name, call.options.any_case) {
        Some(ArgKey::Named(existing)) if call.options.any_case && existing != call.name => {
            let node = tree
                .frame(frame)
                .and_then(|f| f.named_args.get(&existing))
                .map(|n| n.borrow().clone());
            let text = tree.text(frame, &ArgKey::Named(existing.clone()));
            if let (Some(node), Some(text)) = (node, text) {
                let scope = tree.frame_mut(frame)?;
                scope.remove(&ArgKey::Named(existing));
                scope.bind(ArgKey::parse(&call.name), node, text);
            }
            Ok(false)
        }
        Some(_) => {
            tracing::debug!(name = %call.name, "define: already bound");
            Ok(false)
        }
        None => {
            set(tree, frame, &call.name, call.value_or_empty())?;
            Ok(true)
        }
    }
}

/// `#preview`: like `#define`, but only on the page rendered directly.
///
/// Lets a template page show sample values when viewed on its own without
/// affecting pages that transclude it.
pub fn preview(tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<bool> {
    if !tree.is_top_level(frame) {
        return Ok(false);
    }
    define(tree, frame, call)
}

/// `#inherit`: pull each named variable from the enclosing frames
pub fn inherit(tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<usize> {
    if !call.options.gate_open() {
        return Ok(0);
    }
    super::inherit(tree, frame, &call.names(), call.options.any_case)
}

/// `#return`: push each named variable into the invoking frame
pub fn return_vars(tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<usize> {
    if !call.options.gate_open() {
        return Ok(0);
    }
    super::return_vars(tree, frame, &call.names(), call.options.any_case)
}

/// `#unset`: remove each named variable, optionally shifting positions
pub fn unset(tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<usize> {
    if !call.options.gate_open() {
        return Ok(0);
    }
    let mut removed = 0;
    for name in call.names() {
        if unset_binding(tree, frame, &name, call.options.any_case, call.options.shift)? {
            removed += 1;
        }
    }
    Ok(removed)
}
