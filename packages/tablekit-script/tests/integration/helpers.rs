//! Shared fixtures.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use tablekit_core::config::{PlatformConfig, ScriptConfig};
use tablekit_core::storage::Row;
use tablekit_script::{EmailMessage, EmailSender, ScriptEngine, ScriptError};

/// Sender that keeps every message it is given.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send_email(&self, message: EmailMessage) -> tablekit_script::Result<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}

/// Sender whose transport is always down.
pub struct FailingSender;

#[async_trait]
impl EmailSender for FailingSender {
    async fn send_email(&self, _message: EmailMessage) -> tablekit_script::Result<()> {
        Err(ScriptError::Email("smtp unavailable".to_string()))
    }
}

pub fn engine_with(script: ScriptConfig, mailer: Arc<dyn EmailSender>) -> ScriptEngine {
    let mut config = PlatformConfig::new();
    config.script = script;
    config.email.from = "scripts@tablekit.test".to_string();
    ScriptEngine::new(&config, mailer)
}

pub fn engine() -> (Arc<RecordingSender>, ScriptEngine) {
    let sender = Arc::new(RecordingSender::default());
    let engine = engine_with(ScriptConfig::default(), sender.clone());
    (sender, engine)
}

pub fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap()
}

pub fn slugs(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
