// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, credentials, opt, output_flags, Ctx};
use crate::ledger::{NewUser, DEFAULT_CATEGORIES, RESET_CODE_TTL_MINUTES};
use crate::utils::maybe_print_json;
use anyhow::{bail, Context, Result};
use chrono::Local;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("register", sub)) => register(ctx, sub)?,
        Some(("login-check", sub)) => login_check(ctx, sub)?,
        Some(("reset", sub)) => reset(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn register(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let (username, password) = credentials(sub)?;
    let user = ctx
        .ledger
        .register(&NewUser {
            username,
            email: arg(sub, "email")?,
            phone: arg(sub, "phone")?,
            password,
        })
        .context("Registration failed")?;
    println!(
        "Registered '{}' with {} default categories",
        user.username,
        DEFAULT_CATEGORIES.len()
    );
    Ok(())
}

fn login_check(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let session = match opt(sub, "service") {
        Some(service) => {
            let (user, password) = credentials(sub)?;
            ctx.ledger
                .login_third_party(service, user, password)
                .with_context(|| format!("{} login failed", service))?
        }
        None => ctx.session(sub)?,
    };
    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &session)? {
        println!("Logged in as '{}'", session.username());
    }
    Ok(())
}

fn reset(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let now = Local::now().naive_local();
    if let Some(identifier) = opt(sub, "identifier") {
        let code = ctx.ledger.request_password_reset(identifier, now)?;
        println!(
            "Reset code: {} (valid for {} minutes)",
            code, RESET_CODE_TTL_MINUTES
        );
        return Ok(());
    }
    let code = arg(sub, "code")?;
    let Some(new_password) = opt(sub, "new-password") else {
        bail!("--new-password is required with --code");
    };
    ctx.ledger.reset_password(code, new_password, now)?;
    println!("Password updated");
    Ok(())
}
