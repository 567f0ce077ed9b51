//! Keys command - inspect and create the HMAC key.

use anyhow::{Context, bail};
use sealog_crypto::HashEngine;
use serde::Serialize;

use crate::context::{App, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct KeyInfo {
    key_id: String,
    source: String,
}

/// Show the fingerprint of the active key.
pub(crate) fn show_key(app: &App) -> anyhow::Result<()> {
    let engine = app.existing_engine()?;
    let info = KeyInfo {
        key_id: engine.key_id_hex(),
        source: app.key_source(),
    };

    if app.is_json() {
        return print_json(&info);
    }

    println!("\n{}", Theme::header("HMAC Key"));
    println!("{}", Theme::kv("Key ID", &info.key_id));
    println!("{}", Theme::kv("Source", &info.source));
    println!();
    Ok(())
}

/// Create a key file. An existing key is only replaced with `force`.
pub(crate) fn generate_key(app: &App, force: bool) -> anyhow::Result<()> {
    let path = app.key_path();
    if path.exists() {
        if !force {
            bail!(
                "key already exists at {}; pass --force to replace it",
                path.display()
            );
        }
        println!(
            "{}",
            Theme::warning("Replacing the key: existing events will no longer verify")
        );
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
    }

    let engine = HashEngine::load_or_generate(path)
        .with_context(|| format!("failed to write key to {}", path.display()))?;
    tracing::info!(key_id = %engine.key_id_hex(), path = %path.display(), "Generated HMAC key");

    if app.is_json() {
        return print_json(&KeyInfo {
            key_id: engine.key_id_hex(),
            source: path.display().to_string(),
        });
    }

    println!("{}", Theme::success("Generated new HMAC key"));
    println!("{}", Theme::kv("Key ID", &engine.key_id_hex()));
    println!("{}", Theme::kv("Path", &path.display().to_string()));
    Ok(())
}
