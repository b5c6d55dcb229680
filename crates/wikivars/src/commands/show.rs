//! Show command - stored sets of one page

use crate::context::Context;
use crate::output::{print_json, print_text, set_label};
use anyhow::{Result, bail};
use colored::Colorize;
use wikivars_core::gateway::PersistenceGateway;
use wikivars_core::variable::Variable;

pub fn run(ctx: &Context, page_id: u64, set: Option<&str>, json: bool) -> Result<()> {
    let Some(mut collection) = ctx.store.load_sets(page_id)? else {
        bail!("Nothing stored for page {}", page_id);
    };

    if let Some(name) = set {
        let name = wikivars_core::set::truncate_key(name);
        if !collection.sets.contains_key(&name) {
            bail!("Page {} has no set '{}'", page_id, name);
        }
        collection.sets.retain(|k, _| *k == name);
        collection.set_ids.retain(|k, _| *k == name);
    }

    if json {
        return print_json(&collection);
    }

    print_text(&format!(
        "{} page {} (revision {})",
        "→".cyan(),
        page_id,
        collection.rev_id
    ))?;
    for (name, stored) in &collection.sets {
        let id = collection
            .set_ids
            .get(name)
            .map(|id| format!(" #{}", id))
            .unwrap_or_default();
        print_text(&format!("\n{}{}", set_label(name).bold(), id.dimmed()))?;
        for (var, value) in &stored.variables {
            print_text(&format!("  {} = {}", var, render_value(value)))?;
        }
    }
    Ok(())
}

fn render_value(value: &Variable) -> String {
    match value {
        Variable::Text(text) => text.clone(),
        Variable::NeedsParse(raw) => format!("{} {}", raw, "(markup)".yellow()),
    }
}
