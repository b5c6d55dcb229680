//! Scoped variable resolution over a [`FrameTree`]
//!
//! Variables are template arguments: a name made of a canonical integer
//! addresses the positional (numbered) storage of a frame, any other name the
//! named storage. Lookups never fail loudly; a missing variable is `None` and
//! callers decide what that means.
//!
//! ## Case rules
//!
//! - Exact matches always win.
//! - With `any_case`, named bindings are compared case-insensitively and the
//!   last match in insertion order is taken.
//! - Digit-only names are never case folded.

pub mod verbs;


use crate::error::{Result, VarsError};
use crate::frame::{is_digits, ArgKey, ArgValue, FrameId, FrameTree, ScopeFrame};
use indexmap::IndexMap;

/// Look `name` up in `frame`, then in its ancestors when `check_ancestors`
pub fn get(
    tree: &FrameTree,
    frame: FrameId,
    name: &str,
    any_case: bool,
    check_ancestors: bool,
) -> Option<String> {
    let (owner, key) = find(tree, frame, name, any_case, check_ancestors)?;
    tree.text(owner, &key)
}

/// Bind `name` to `value` in `frame`.
///
/// Plain text is wrapped in a text node; a node value is expanded for the
/// cache. Rebinding an existing key reuses its node.
pub fn set(tree: &mut FrameTree, frame: FrameId, name: &str, value: ArgValue) -> Result<()> {
    let node = value.into_node();
    let text = tree.expand(&node);
    tree.frame_mut(frame)?.bind(ArgKey::parse(name), node, text);
    Ok(())
}

/// Remove the binding(s) of `name` from `frame`.
///
/// A positional name removes both the numbered entry and a named entry with
/// the same digit string. With `shift`, later positions move down by one to
/// close the gap. Only canonical integers are positions, so `"02"` is
/// removed as a plain named key. Returns whether anything was removed.
pub fn unset(
    tree: &mut FrameTree,
    frame: FrameId,
    name: &str,
    any_case: bool,
    shift: bool,
) -> Result<bool> {
    let frame = tree.frame_mut(frame)?;

    match ArgKey::parse(name) {
        ArgKey::Numbered(index) => {
            let numbered = frame.remove(&ArgKey::Numbered(index));
            let named = frame.remove(&ArgKey::Named(name.to_string()));
            if shift {
                shift_down_after(frame, index);
            }
            Ok(numbered || named)
        }
        ArgKey::Named(key) => {
            let targets: Vec<String> = if any_case && !is_digits(&key) {
                let folded = key.to_lowercase();
                frame
                    .named_args
                    .keys()
                    .filter(|k| k.to_lowercase() == folded)
                    .cloned()
                    .collect()
            } else if frame.named_args.contains_key(&key) {
                vec![key]
            } else {
                Vec::new()
            };

            for target in &targets {
                frame.remove(&ArgKey::Named(target.clone()));
            }
            Ok(!targets.is_empty())
        }
    }
}

/// Copy each name visible from `frame`'s parent upward into `frame`.
///
/// Names that resolve nowhere are skipped. Returns the number of variables
/// written.
pub fn inherit<S: AsRef<str>>(
    tree: &mut FrameTree,
    frame: FrameId,
    names: &[S],
    any_case: bool,
) -> Result<usize> {
    let parent = match tree.frame(frame) {
        Some(f) => f.parent,
        None => return Err(VarsError::FrameNotFound(frame.index())),
    };
    let Some(parent) = parent else {
        return Ok(0);
    };

    let mut written = 0;
    for name in names {
        let name = name.as_ref();
        match find(tree, parent, name, any_case, true) {
            Some((owner, key)) => {
                copy_binding(tree, (owner, &key), frame, name)?;
                written += 1;
            }
            None => tracing::debug!(name, "inherit: no enclosing binding"),
        }
    }
    Ok(written)
}

/// Copy each name bound in `frame` itself into its parent.
///
/// A top-level frame has nowhere to return to and nothing happens.
pub fn return_vars<S: AsRef<str>>(
    tree: &mut FrameTree,
    frame: FrameId,
    names: &[S],
    any_case: bool,
) -> Result<usize> {
    let parent = match tree.frame(frame) {
        Some(f) => f.parent,
        None => return Err(VarsError::FrameNotFound(frame.index())),
    };
    let Some(parent) = parent else {
        return Ok(0);
    };

    let mut written = 0;
    for name in names {
        let name = name.as_ref();
        if let Some(key) = find_local(tree, frame, name, any_case) {
            copy_binding(tree, (frame, &key), parent, name)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Locate the frame and storage key holding `name`
pub(crate) fn find(
    tree: &FrameTree,
    frame: FrameId,
    name: &str,
    any_case: bool,
    check_ancestors: bool,
) -> Option<(FrameId, ArgKey)> {
    if check_ancestors {
        tree.ancestors(frame)
            .find_map(|id| find_local(tree, id, name, any_case).map(|key| (id, key)))
    } else {
        find_local(tree, frame, name, any_case).map(|key| (frame, key))
    }
}

/// Locate `name` among `frame`'s own bindings
pub(crate) fn find_local(
    tree: &FrameTree,
    frame: FrameId,
    name: &str,
    any_case: bool,
) -> Option<ArgKey> {
    let scope = tree.frame(frame)?;

    let key = ArgKey::parse(name);
    if scope.node(&key).is_some() {
        return Some(key);
    }
    // Positional arguments may also be bound under their digit string
    if matches!(key, ArgKey::Numbered(_)) && scope.named_args.contains_key(name) {
        return Some(ArgKey::Named(name.to_string()));
    }

    if !any_case || is_digits(name) {
        return None;
    }

    let folded = name.to_lowercase();
    let mut last = None;
    for k in scope.named_args.keys() {
        if k.to_lowercase() == folded {
            last = Some(k);
        }
    }
    last.map(|k| ArgKey::Named(k.clone()))
}

/// Bind a copy of the node at `source` into `target` under `name`
fn copy_binding(
    tree: &mut FrameTree,
    source: (FrameId, &ArgKey),
    target: FrameId,
    name: &str,
) -> Result<()> {
    let (owner, key) = source;
    let node = tree
        .frame(owner)
        .and_then(|f| f.node(key))
        .map(|n| n.borrow().clone())
        .ok_or(VarsError::FrameNotFound(owner.index()))?;
    let text = tree.text(owner, key).unwrap_or_default();
    tree.frame_mut(target)?.bind(ArgKey::parse(name), node, text);
    Ok(())
}

/// Close the gap left by removing position `removed`.
///
/// Named keys that are canonical integers above `removed` are renumbered as
/// well, mirroring hosts that store `{{T|3=c}}` under a string key. A key is
/// positional here exactly when [`ArgKey::parse`] says so: "03" and names
/// beyond `u32` stay where they are, as they do for `unset` itself.
fn shift_down_after(frame: &mut ScopeFrame, removed: u32) {
    let Some(first) = removed.checked_add(1) else {
        return;
    };

    let moved: Vec<u32> = frame.numbered_args.range(first..).map(|(k, _)| *k).collect();
    for key in moved {
        if let Some(node) = frame.numbered_args.remove(&key) {
            frame.numbered_args.insert(key - 1, node);
        }
        if let Some(text) = frame.numbered_cache.remove(&key) {
            frame.numbered_cache.insert(key - 1, text);
        }
    }

    let shifted = |key: &str| -> Option<String> {
        match ArgKey::parse(key) {
            ArgKey::Numbered(n) if n > removed => Some((n - 1).to_string()),
            _ => None,
        }
    };
    if !frame.named_args.keys().any(|k| shifted(k.as_str()).is_some()) {
        return;
    }

    frame.named_args = rekey(std::mem::take(&mut frame.named_args), &shifted);
    frame.named_cache = rekey(std::mem::take(&mut frame.named_cache), &shifted);
}

fn rekey<V>(
    map: IndexMap<String, V>,
    shifted: &dyn Fn(&str) -> Option<String>,
) -> IndexMap<String, V> {
    map.into_iter()
        .map(|(k, v)| (shifted(k.as_str()).unwrap_or(k), v))
        .collect()
}
