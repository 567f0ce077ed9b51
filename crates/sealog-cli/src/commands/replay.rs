//! Replay commands - timeline, metrics, anomalies.

use colored::Colorize;
use sealog_core::SessionId;
use sealog_replay::{ReplayEngine, SessionMetrics};

use crate::config_bridge;
use crate::context::{App, print_json};
use crate::theme::Theme;

fn load_engine(app: &App, session_id: &SessionId) -> anyhow::Result<ReplayEngine> {
    let storage = app.storage()?;
    let engine = ReplayEngine::from_storage(storage.as_ref(), session_id, app.verifier()?)?
        .with_policy(config_bridge::to_anomaly_policy(&app.config));
    Ok(engine)
}

/// Print the model calls of a session in order.
pub(crate) fn timeline(app: &App, session_id: &SessionId) -> anyhow::Result<()> {
    let decisions = load_engine(app, session_id)?.decision_timeline();

    if app.is_json() {
        return print_json(&decisions);
    }

    if decisions.is_empty() {
        println!("{}", Theme::info("No model interactions in this session"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Decision Timeline"));
    println!(
        "{:<23} {:<24} {:>10} {:>5} {:>8}",
        "TIMESTAMP".dimmed(),
        "MODEL".dimmed(),
        "LATENCY".dimmed(),
        "MSGS".dimmed(),
        "RESP".dimmed()
    );
    println!("{}", Theme::separator());
    for decision in &decisions {
        println!(
            "{:<23} {:<24} {:>8.1}ms {:>5} {:>8}",
            Theme::timestamp(&decision.timestamp.0),
            decision.model,
            decision.latency_ms,
            decision.message_count,
            decision.response_length
        );
    }
    println!();
    Ok(())
}

/// Print aggregate metrics for a session.
pub(crate) fn metrics(app: &App, session_id: &SessionId) -> anyhow::Result<()> {
    let metrics = load_engine(app, session_id)?.session_metrics();

    if app.is_json() {
        return print_json(&metrics);
    }

    let summary = match &metrics {
        SessionMetrics::Empty => {
            println!("{}", Theme::info("No events in this session"));
            return Ok(());
        },
        SessionMetrics::Summary(summary) => summary,
    };

    println!("\n{}", Theme::header("Session Metrics"));
    println!("{}", Theme::kv("Events", &summary.total_events.to_string()));
    println!(
        "{}",
        Theme::kv("Interactions", &summary.interaction_count.to_string())
    );
    println!(
        "{}",
        Theme::kv("Duration", &format!("{:.3}s", summary.duration_seconds))
    );
    println!(
        "{}",
        Theme::kv("Avg latency", &format!("{:.1}ms", summary.average_latency_ms))
    );
    println!(
        "{}",
        Theme::kv("Events/minute", &format!("{:.2}", summary.events_per_minute))
    );
    for (counter, total) in &summary.total_token_usage {
        println!("{}", Theme::kv(counter, &total.to_string()));
    }
    println!(
        "{}",
        Theme::kv("Integrity", &Theme::validity(summary.all_hashes_valid))
    );
    println!();
    Ok(())
}

/// Print latency outliers for a session.
pub(crate) fn anomalies(app: &App, session_id: &SessionId) -> anyhow::Result<()> {
    let anomalies = load_engine(app, session_id)?.anomaly_detection();

    if app.is_json() {
        return print_json(&anomalies);
    }

    if anomalies.is_empty() {
        println!("{}", Theme::success("No anomalies detected"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Anomalies"));
    println!("{}", Theme::separator());
    for anomaly in &anomalies {
        println!(
            "{} {} {}",
            Theme::timestamp(&anomaly.timestamp.0),
            Theme::short_id(&anomaly.event_id),
            Theme::warning(&anomaly.description)
        );
    }
    println!();
    Ok(())
}
