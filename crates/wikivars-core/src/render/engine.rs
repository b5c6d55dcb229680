use super::SideChannel;
use crate::config::consts::stash::SAVED_SETS;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::frame::{ArgKey, ArgNode, ArgValue, FrameId, FrameTree};
use crate::gateway::PersistenceGateway;
use crate::resolver::verbs::{self, VerbCall};
use crate::resolver::{self, find_local};
use crate::set::{PageId, RevId, SetCollection};
use crate::upsert::{plan, ApplyReport};
use crate::variable::Variable;

/// Result of persisting a render's sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// `features.data` is off
    Disabled,
    /// Stored sets already match the render
    Unchanged,
    Applied(ApplyReport),
}

/// Verbs wired to a configuration and a storage gateway
#[derive(Debug)]
pub struct VariablesEngine<G> {
    config: EngineConfig,
    gateway: G,
}

impl<G: PersistenceGateway> VariablesEngine<G> {
    pub fn new(config: EngineConfig, gateway: G) -> Self {
        Self { config, gateway }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn define(&self, tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<bool> {
        if !self.config.features.define {
            return Ok(false);
        }
        verbs::define(tree, frame, call)
    }

    pub fn local(&self, tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<bool> {
        if !self.config.features.define {
            return Ok(false);
        }
        verbs::local(tree, frame, call)
    }

    pub fn preview(&self, tree: &mut FrameTree, frame: FrameId, call: &VerbCall) -> Result<bool> {
        if !self.config.features.define {
            return Ok(false);
        }
        verbs::preview(tree, frame, call)
    }

    /// `#save`: copy variables bound in `frame` into the render's collection.
    ///
    /// The set comes from `set=` and defaults to the unnamed set. With
    /// `savemarkup` the unexpanded source is kept and expanded again on load.
    /// Returns the number of variables captured.
    pub fn save(
        &self,
        tree: &FrameTree,
        frame: FrameId,
        stash: &mut dyn SideChannel,
        page_id: PageId,
        call: &VerbCall,
    ) -> Result<usize> {
        if !self.config.features.data || !call.options.gate_open() {
            return Ok(0);
        }
        let set_name = call.options.set_name.as_deref().unwrap_or_default();

        let mut captured = Vec::new();
        for name in call.names() {
            let Some(key) = find_local(tree, frame, &name, call.options.any_case) else {
                tracing::debug!(name = %name, "save: variable not bound here");
                continue;
            };
            let variable = if call.options.save_markup {
                match node_of(tree, frame, &key) {
                    Some(ArgNode::Markup(raw)) => Variable::NeedsParse(raw),
                    Some(ArgNode::Text(text)) => Variable::Text(text),
                    None => continue,
                }
            } else {
                match tree.text(frame, &key) {
                    Some(text) => Variable::Text(text),
                    None => continue,
                }
            };
            captured.push((name, variable));
        }
        if captured.is_empty() {
            return Ok(0);
        }

        if stash.get(SAVED_SETS).is_none() {
            stash.put(SAVED_SETS, SetCollection::new(page_id, 0));
        }
        let Some(collection) = stash.get_mut(SAVED_SETS) else {
            return Ok(0);
        };
        let set = collection.set_mut(set_name);
        let count = captured.len();
        for (name, variable) in captured {
            set.insert(&name, variable);
        }
        Ok(count)
    }

    /// `#load`: bind stored variables of `page_id` that `frame` lacks.
    ///
    /// Missing pages, sets and variables load nothing. Returns the number
    /// of variables bound.
    pub fn load(
        &self,
        tree: &mut FrameTree,
        frame: FrameId,
        page_id: PageId,
        call: &VerbCall,
    ) -> Result<usize> {
        if !self.config.features.data || !call.options.gate_open() {
            return Ok(0);
        }
        let set_name = call.options.set_name.as_deref().unwrap_or_default();
        let Some(variables) = self
            .gateway
            .load_filtered(page_id, set_name, &call.names())?
        else {
            return Ok(0);
        };

        let mut bound = 0;
        for (name, variable) in variables {
            if find_local(tree, frame, &name, call.options.any_case).is_some() {
                continue;
            }
            let value = match variable {
                Variable::Text(text) => ArgValue::Text(text),
                Variable::NeedsParse(raw) => ArgValue::Node(ArgNode::Markup(raw)),
            };
            resolver::set(tree, frame, &name, value)?;
            bound += 1;
        }
        Ok(bound)
    }

    /// Persist the sets saved during a render of `page_id` at `rev_id`.
    ///
    /// A render that saved nothing removes whatever the page had stored.
    pub fn flush(
        &self,
        stash: &mut dyn SideChannel,
        page_id: PageId,
        rev_id: RevId,
    ) -> Result<FlushOutcome> {
        if !self.config.features.data {
            return Ok(FlushOutcome::Disabled);
        }
        let new = stash.take(SAVED_SETS).map(|mut collection| {
            collection.page_id = page_id;
            collection.rev_id = rev_id;
            collection
        });
        let old = self.gateway.load_sets(page_id)?;

        let plan = plan(old.as_ref(), new.as_ref());
        if plan.is_empty() {
            return Ok(FlushOutcome::Unchanged);
        }
        let report = self.gateway.save_plan(&plan)?;
        tracing::debug!(
            page_id,
            rev_id,
            operations = plan.total(),
            stale = report.stale_sets.len(),
            "flushed saved sets"
        );
        Ok(FlushOutcome::Applied(report))
    }

    /// Forget everything stored for a deleted page
    pub fn page_deleted(&self, page_id: PageId) -> Result<bool> {
        self.gateway.delete_all(page_id)
    }
}

fn node_of(tree: &FrameTree, frame: FrameId, key: &ArgKey) -> Option<ArgNode> {
    tree.frame(frame)?.node(key).map(|n| n.borrow().clone())
}
