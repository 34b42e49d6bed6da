// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, output_flags, Ctx};
use crate::utils::{maybe_print_json, pretty_table};
use crate::validate;
use anyhow::{bail, Result};
use serde::Serialize;

#[derive(Serialize)]
struct LinkedRow {
    service: String,
    username: String,
}

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "link" => {
            let a = ctx.ledger.link_account(
                &session,
                arg(sub, "service")?,
                arg(sub, "account-user")?,
                arg(sub, "account-password")?,
            )?;
            println!("Linked {} account '{}'", a.service, a.service_username);
        }
        "list" => {
            // never print stored service passwords
            let data: Vec<LinkedRow> = ctx
                .ledger
                .linked_accounts(&session)?
                .into_iter()
                .map(|a| LinkedRow {
                    service: a.service.to_string(),
                    username: a.service_username,
                })
                .collect();
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                let rows = data.into_iter().map(|r| vec![r.service, r.username]).collect();
                println!("{}", pretty_table(&["Service", "Username"], rows));
            }
        }
        "rm" => {
            let service = validate::service(arg(sub, "service")?)?;
            if !ctx.ledger.unlink_account(&session, service)? {
                bail!("No {} account linked", service);
            }
            println!("Unlinked {} account", service);
        }
        _ => {}
    }
    Ok(())
}
