//! Shared command context.

use anyhow::{Context, Result, bail};
use sealog_audit::{EventStorage, FileEventStorage, IntegrityVerifier, sort_chronologically};
use sealog_config::Config;
use sealog_core::SessionId;
use sealog_crypto::HashEngine;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::OutputFormat;

/// Configuration plus the handles commands open on demand.
pub(crate) struct App {
    pub(crate) config: Config,
    pub(crate) output: OutputFormat,
    hmac_key: Option<String>,
}

impl App {
    pub(crate) fn new(config: Config, output: OutputFormat, hmac_key: Option<String>) -> Self {
        Self {
            config,
            output,
            hmac_key,
        }
    }

    pub(crate) fn key_path(&self) -> &Path {
        Path::new(&self.config.keys.path)
    }

    /// Where the active key comes from, for display.
    pub(crate) fn key_source(&self) -> String {
        if self.hmac_key.is_some() {
            "SEALOG_HMAC_KEY / --hmac-key".to_owned()
        } else {
            self.key_path().display().to_string()
        }
    }

    /// Engine for writing: creates the key file if it does not exist.
    pub(crate) fn engine(&self) -> Result<Arc<HashEngine>> {
        let engine = match &self.hmac_key {
            Some(hex) => HashEngine::from_hex(hex.trim()).context("invalid SEALOG_HMAC_KEY")?,
            None => HashEngine::load_or_generate(self.key_path()).with_context(|| {
                format!("failed to load key from {}", self.key_path().display())
            })?,
        };
        Ok(Arc::new(engine))
    }

    /// Engine for checking: never creates a key, since a fresh key would
    /// report every stored event as tampered.
    pub(crate) fn existing_engine(&self) -> Result<Arc<HashEngine>> {
        if self.hmac_key.is_none() && !self.key_path().exists() {
            bail!(
                "no HMAC key at {}; set SEALOG_HMAC_KEY or keys.path",
                self.key_path().display()
            );
        }
        self.engine()
    }

    pub(crate) fn verifier(&self) -> Result<IntegrityVerifier> {
        Ok(IntegrityVerifier::new(self.existing_engine()?))
    }

    pub(crate) fn storage(&self) -> Result<Arc<FileEventStorage>> {
        let storage = FileEventStorage::open(&self.config.storage.path)
            .with_context(|| format!("failed to open {}", self.config.storage.path))?;
        Ok(Arc::new(storage))
    }

    /// Resolve a session from an explicit ID or `--last`.
    pub(crate) fn resolve_session(&self, id: Option<&str>, last: bool) -> Result<SessionId> {
        match (id, last) {
            (Some(id), false) => {
                SessionId::parse(id).with_context(|| format!("invalid session id `{id}`"))
            },
            (None, true) => most_recent_session(self.storage()?.as_ref()),
            (Some(_), true) => bail!("Cannot specify both a session ID and --last"),
            (None, false) => bail!("Provide a session ID or use --last"),
        }
    }

    pub(crate) fn is_json(&self) -> bool {
        self.output == OutputFormat::Json
    }
}

/// The session whose latest event is newest.
fn most_recent_session(storage: &dyn EventStorage) -> Result<SessionId> {
    let mut newest = None;
    for session_id in storage.list_sessions()? {
        let mut events = storage.fetch_by_session(&session_id)?;
        sort_chronologically(&mut events);
        if let Some(last) = events.last()
            && newest.as_ref().is_none_or(|(ts, _)| last.timestamp >= *ts)
        {
            newest = Some((last.timestamp, session_id));
        }
    }
    newest
        .map(|(_, id)| id)
        .ok_or_else(|| anyhow::anyhow!("No sessions found"))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
