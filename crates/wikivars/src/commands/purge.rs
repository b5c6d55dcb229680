//! Purge command - drop a page from the store

use crate::context::Context;
use crate::output::print_text;
use anyhow::Result;
use colored::Colorize;
use wikivars_core::gateway::PersistenceGateway;

/// Removing a page that has nothing stored is not an error
pub fn run(ctx: &Context, page_id: u64) -> Result<()> {
    if ctx.store.delete_all(page_id)? {
        print_text(&format!("{} Purged page {}", "✓".green(), page_id))?;
    } else {
        print_text(&format!("Nothing stored for page {}", page_id))?;
    }
    Ok(())
}
