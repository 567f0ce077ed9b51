//! Verify command - recompute stored hashes.

use anyhow::{Context, bail};
use colored::Colorize;
use sealog_audit::VerificationReport;
use sealog_core::SessionId;
use serde::Serialize;

use crate::context::{App, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct SessionReport<'a> {
    session_id: &'a str,
    #[serde(flatten)]
    report: &'a VerificationReport,
}

/// Verify one session, or every session when none is given.
///
/// Exits with an error if any event fails verification.
pub(crate) fn verify(app: &App, session: Option<&str>) -> anyhow::Result<()> {
    let storage = app.storage()?;
    let verifier = app.verifier()?;

    let reports = match session {
        Some(id) => {
            let session_id =
                SessionId::parse(id).with_context(|| format!("invalid session id `{id}`"))?;
            let report = verifier.verify_session(storage.as_ref(), &session_id)?;
            vec![(session_id.to_string(), report)]
        },
        None => verifier.verify_all(storage.as_ref())?,
    };

    if app.is_json() {
        let out: Vec<_> = reports
            .iter()
            .map(|(session_id, report)| SessionReport { session_id, report })
            .collect();
        print_json(&out)?;
    } else {
        print_reports(&reports);
    }

    let tampered: usize = reports.iter().map(|(_, r)| r.invalid_count).sum();
    if tampered > 0 {
        bail!("{tampered} event(s) failed verification");
    }
    Ok(())
}

fn print_reports(reports: &[(String, VerificationReport)]) {
    if reports.is_empty() {
        println!("{}", Theme::info("No sessions recorded"));
        return;
    }

    for (session_id, report) in reports {
        println!("\n{}", Theme::header(&format!("Session {session_id}")));
        println!("{}", Theme::kv("Events", &report.total_events.to_string()));
        println!("{}", Theme::kv("Valid", &report.valid_count.to_string()));
        println!("{}", Theme::kv("Invalid", &report.invalid_count.to_string()));
        println!("{}", Theme::kv("Merkle root", &report.merkle_root.to_hex()));

        if report.all_valid {
            println!("{}", Theme::success("All hashes verified"));
            continue;
        }

        println!("{}", Theme::separator());
        for check in report.failures() {
            let reason = check
                .issue
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            println!(
                "  {} {} {}",
                Theme::validity(false),
                check.event_id,
                reason.dimmed()
            );
        }
        println!(
            "{}",
            Theme::error(&format!("{} event(s) failed verification", report.invalid_count))
        );
    }
    println!();
}
