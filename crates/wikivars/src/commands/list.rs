//! List command - pages present in the store

use crate::context::Context;
use crate::output::{print_json, print_text};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PageSummary {
    page_id: u64,
    sets: usize,
    variables: usize,
    updated_at: Option<String>,
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let mut pages = Vec::new();
    for page_id in ctx.store.pages()? {
        let Some(record) = ctx.store.load_record(page_id)? else {
            continue;
        };
        pages.push(PageSummary {
            page_id,
            sets: record.sets.len(),
            variables: record.sets.values().map(|s| s.variables.len()).sum(),
            updated_at: record.updated_at.map(|t| t.to_rfc3339()),
        });
    }

    if json {
        return print_json(&serde_json::json!({
            "store": ctx.store.root().display().to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "pages": pages,
        }));
    }

    if pages.is_empty() {
        print_text(&format!(
            "No pages stored in {}",
            ctx.store.root().display()
        ))?;
        return Ok(());
    }

    for page in &pages {
        print_text(&format!(
            "{} {}  {} sets, {} variables",
            "•".cyan(),
            format!("page {}", page.page_id).bold(),
            page.sets,
            page.variables
        ))?;
        if ctx.verbose {
            if let Some(updated_at) = &page.updated_at {
                print_text(&format!("    updated {}", updated_at))?;
            }
        }
    }
    Ok(())
}
