mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::Context;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Context::new(cli.config.as_deref(), cli.store.as_deref(), cli.verbose).and_then(
        |ctx| match cli.command {
            Commands::List { json } => commands::list::run(&ctx, json),
            Commands::Show { page_id, set, json } => {
                commands::show::run(&ctx, page_id, set.as_deref(), json)
            }
            Commands::Purge { page_id } => commands::purge::run(&ctx, page_id),
            Commands::Diff {
                page_id,
                file,
                rev,
                apply,
                json,
            } => commands::diff::run(&ctx, page_id, &file, rev, apply, json),
        },
    );

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
