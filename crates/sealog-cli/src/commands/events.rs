//! Event commands - append, list sessions, show a session.

use anyhow::{Context, bail};
use colored::Colorize;
use sealog_audit::{EventLog, EventStorage, sort_chronologically};
use sealog_core::{SessionId, Value};
use serde::Serialize;
use std::sync::Arc;

use crate::context::{App, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct Appended {
    event_id: String,
    session_id: String,
}

#[derive(Serialize)]
struct SessionSummary {
    session_id: String,
    events: usize,
    last_event: Option<String>,
}

/// Append one event, starting a new session unless one is given.
pub(crate) fn append(
    app: &App,
    event_type: &str,
    payload: &str,
    session: Option<&str>,
) -> anyhow::Result<()> {
    let payload = Value::from_json_str(payload).context("payload is not valid JSON")?;
    if !matches!(payload, Value::Map(_)) {
        bail!("payload must be a JSON object, got {}", payload.type_name());
    }

    let session_id = match session {
        Some(id) => {
            SessionId::parse(id).with_context(|| format!("invalid session id `{id}`"))?
        },
        None => SessionId::new(),
    };

    let log = EventLog::new(app.storage()?, app.engine()?, session_id.clone());
    let event_id = log.append(event_type, payload)?;

    if app.is_json() {
        return print_json(&Appended {
            event_id: event_id.to_string(),
            session_id: session_id.to_string(),
        });
    }

    println!(
        "{}",
        Theme::success(&format!("Appended {event_type} event {event_id}"))
    );
    println!("{}", Theme::kv("Session", &session_id.to_string()));
    Ok(())
}

/// List sessions with their event counts.
pub(crate) fn list_sessions(app: &App) -> anyhow::Result<()> {
    let storage = app.storage()?;
    let mut summaries = Vec::new();
    for session_id in storage.list_sessions()? {
        let mut events = storage.fetch_by_session(&session_id)?;
        sort_chronologically(&mut events);
        summaries.push(SessionSummary {
            session_id: session_id.to_string(),
            events: events.len(),
            last_event: events.last().map(|e| e.timestamp.to_canonical_string()),
        });
    }

    if app.is_json() {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!("{}", Theme::info("No sessions recorded"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Sessions"));
    println!(
        "{:<38} {:>8}  {}",
        "SESSION".dimmed(),
        "EVENTS".dimmed(),
        "LAST EVENT".dimmed()
    );
    println!("{}", Theme::separator());
    for summary in &summaries {
        println!(
            "{:<38} {:>8}  {}",
            summary.session_id.cyan(),
            summary.events,
            summary.last_event.as_deref().unwrap_or("-").dimmed()
        );
    }
    println!();
    Ok(())
}

/// Print a session's events in order.
pub(crate) fn show_session(app: &App, session_id: &SessionId) -> anyhow::Result<()> {
    let storage: Arc<dyn EventStorage> = app.storage()?;
    let mut events = storage.fetch_by_session(session_id)?;
    sort_chronologically(&mut events);

    if app.is_json() {
        return print_json(&events);
    }

    if events.is_empty() {
        println!("{}", Theme::info("No events for this session"));
        return Ok(());
    }

    println!("\n{}", Theme::header(&format!("Session {session_id}")));
    println!(
        "{:<23} {:<20} {:<8} {}",
        "TIMESTAMP".dimmed(),
        "TYPE".dimmed(),
        "EVENT".dimmed(),
        "HASH".dimmed()
    );
    println!("{}", Theme::separator());
    for event in &events {
        println!(
            "{:<23} {:<20} {:<8} {}",
            Theme::timestamp(&event.timestamp.0),
            event.event_type,
            Theme::short_id(&event.event_id),
            Theme::digest(&event.hash)
        );
    }
    println!();
    Ok(())
}
