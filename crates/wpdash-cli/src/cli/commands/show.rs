//! `wpdash-child show` and `wpdash-child security-id`.

use anyhow::{Context, Result};
use wpdash_enroll::types::DISPLAY_FORMAT;
use wpdash_enroll::{ConnectionStatus, Enrollment};

use super::finish;
use crate::cli::args::ShowArgs;
use crate::exit_codes::{self, SUCCESS};

pub async fn run(args: ShowArgs, enrollment: &Enrollment) -> Result<i32> {
    let status = match enrollment.status().await {
        Ok(status) => status,
        Err(e) => return Ok(exit_codes::report(&e)),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&status).context("failed to serialize status")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&status));
    }
    Ok(SUCCESS)
}

pub async fn run_security_id(enrollment: &Enrollment) -> Result<i32> {
    let result = enrollment.generate_pairing_secret_if_absent().await;
    Ok(finish(result, |secret| println!("{secret}")))
}

fn render_text(status: &ConnectionStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("Identity:    {}\n", status.identity));
    out.push_str(&format!(
        "Connected:   {}\n",
        if status.connected { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "Security ID: {}\n",
        status.security_id.as_deref().unwrap_or("(not generated)")
    ));
    match &status.ssh_key {
        Some(key) => out.push_str(&format!("SSH key:     {key}\n")),
        None => out.push_str("SSH key:     (none)\n"),
    }
    if let Some(at) = status.last_sync {
        out.push_str(&format!("Last sync:   {}\n", at.format(DISPLAY_FORMAT)));
    }
    if status.can_regenerate {
        out.push_str("\nRun `wpdash-child regenerate` after changing the site URL.\n");
    }
    out
}
