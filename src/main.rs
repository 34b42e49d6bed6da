// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use finsage::commands::{self, advice, Ctx};
use finsage::{cli, config::Config, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    logging::init(matches.get_flag("verbose"));
    let config = Config::load(matches.get_one::<PathBuf>("data-dir").cloned())?;
    let ctx = Ctx::open(config)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Data directory ready at {}", ctx.config.data_dir.display());
        }
        Some(("user", sub)) => commands::users::handle(&ctx, sub)?,
        Some(("category", sub)) => commands::categories::handle(&ctx, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&ctx, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&ctx, sub)?,
        Some(("holiday", sub)) => commands::holidays::handle(&ctx, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&ctx, sub)?,
        Some(("threshold", sub)) => commands::thresholds::handle(&ctx, sub)?,
        Some(("report", sub)) => commands::reports::handle(&ctx, sub)?,
        Some(("import", sub)) => commands::importer::handle(&ctx, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&ctx, sub)?,
        Some(("advise", sub)) => advice::handle_advise(&ctx, sub)?,
        Some(("forecast", sub)) => advice::handle_forecast(&ctx, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&ctx)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
