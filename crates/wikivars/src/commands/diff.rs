//! Diff command - plan storing a rendered collection and optionally apply it

use crate::context::Context;
use crate::output::{print_json, print_text, set_label};
use anyhow::{Context as _, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::Path;
use wikivars_core::gateway::PersistenceGateway;
use wikivars_core::set::SetCollection;
use wikivars_core::upsert::{ApplyReport, UpsertPlan, diff_variables, plan};
use wikivars_core::variable::Variable;

type RenderedSets = BTreeMap<String, BTreeMap<String, Variable>>;

pub fn run(
    ctx: &Context,
    page_id: u64,
    file: &Path,
    rev: Option<u64>,
    apply: bool,
    json: bool,
) -> Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let rendered: RenderedSets = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a set name -> variables object", file.display()))?;

    if !ctx.config.features.data {
        log::warn!("features.data is off; renders will not write these sets");
    }

    let old = ctx.store.load_sets(page_id)?;
    let rev_id = rev.unwrap_or_else(|| old.as_ref().map_or(1, |c| c.rev_id.saturating_add(1)));
    let new = collect(page_id, rev_id, rendered);
    let plan = plan(old.as_ref(), Some(&new));

    let report = if apply && !plan.is_empty() {
        Some(ctx.store.save_plan(&plan)?)
    } else {
        None
    };

    if json {
        return print_json(&serde_json::json!({
            "plan": plan,
            "applied": report.is_some(),
            "report": report,
        }));
    }

    render_human(&plan, report.as_ref())
}

fn collect(page_id: u64, rev_id: u64, rendered: RenderedSets) -> SetCollection {
    let mut collection = SetCollection::new(page_id, rev_id);
    for (set_name, variables) in rendered {
        let set = collection.set_mut(&set_name);
        for (name, variable) in variables {
            set.insert(&name, variable);
        }
    }
    collection
}

fn render_human(plan: &UpsertPlan, report: Option<&ApplyReport>) -> Result<()> {
    if plan.is_empty() {
        print_text(&format!("{} Stored sets are up to date", "✓".green()))?;
        return Ok(());
    }

    print_text(&format!(
        "{} page {}: revision {} → {}",
        "→".cyan(),
        plan.page_id,
        plan.old_rev_id,
        plan.new_rev_id
    ))?;
    for id in &plan.deletes {
        print_text(&format!("  {} set #{}", "-".red(), id))?;
    }
    for set in &plan.inserts {
        print_text(&format!(
            "  {} {} ({} variables)",
            "+".green(),
            set_label(&set.name),
            set.len()
        ))?;
    }
    for (id, (old, new)) in &plan.updates {
        let diff = diff_variables(old, new);
        let line = format!(
            "  {} {} #{}: {} inserted, {} updated, {} deleted",
            "~".yellow(),
            set_label(&new.name),
            id,
            diff.inserts.len(),
            diff.updates.len(),
            diff.deletes.len()
        );
        if diff.is_empty() {
            print_text(&line.dimmed().to_string())?;
        } else {
            print_text(&line)?;
        }
    }

    match report {
        Some(report) => {
            print_text(&format!(
                "{} Applied: {} rows inserted, {} updated, {} deleted",
                "✓".green(),
                report.rows_inserted,
                report.rows_updated,
                report.rows_deleted
            ))?;
            if !report.stale_sets.is_empty() {
                print_text(&format!(
                    "{} {} set(s) already stored at a newer revision",
                    "!".yellow(),
                    report.stale_sets.len()
                ))?;
            }
        }
        None => print_text("Run with --apply to write these changes")?,
    }
    Ok(())
}
