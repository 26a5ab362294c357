//! Table scripts.
//!
//! A table script is user-written JavaScript that runs at a point of the row
//! lifecycle. The [`ScriptEngine`] takes it through three phases:
//!
//! 1. [`normalizer`] adds the statement terminators authors tend to omit.
//! 2. [`binder`] exposes the row's fields as variables.
//! 3. [`executor`] evaluates the result in a fresh, restricted interpreter.
//!
//! Emails queued by a successful run are handed to an [`EmailSender`].

pub mod binder;
pub mod email;
pub mod error;
pub mod executor;
pub mod normalizer;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use tablekit_core::config::{EmailConfig, PlatformConfig};
use tablekit_core::storage::Row;
use tablekit_core::table::{ExecutionMoment, UserAction};
use tablekit_core::EntityId;

pub use email::{EmailMessage, EmailRequest, EmailSender, TracingEmailSender};
pub use error::{Result, ScriptError};
pub use executor::{ExecutionResult, Sandbox, SandboxExecutor};

/// Values a script sees besides the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptContext {
    pub user_action: Option<UserAction>,
    pub execution_moment: Option<ExecutionMoment>,
    pub user_id: Option<EntityId>,
    pub table_id: Option<EntityId>,
}

impl ScriptContext {
    /// Global names and values; absent values are `null`.
    pub fn globals(&self) -> Vec<(&'static str, Value)> {
        let text = |value: Option<&str>| value.map_or(Value::Null, |v| Value::String(v.to_string()));
        vec![
            ("userAction", text(self.user_action.map(|a| a.as_str()))),
            (
                "executionMoment",
                text(self.execution_moment.map(|m| m.as_str())),
            ),
            ("userId", text(self.user_id.as_deref())),
            ("tableId", text(self.table_id.as_deref())),
        ]
    }
}

/// How a failed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Exception,
}

/// Progress of one script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Idle,
    Normalizing,
    Binding,
    Running,
    Succeeded,
    Failed(FailureKind),
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPhase::Idle => f.write_str("IDLE"),
            ExecutionPhase::Normalizing => f.write_str("NORMALIZING"),
            ExecutionPhase::Binding => f.write_str("BINDING"),
            ExecutionPhase::Running => f.write_str("RUNNING"),
            ExecutionPhase::Succeeded => f.write_str("SUCCEEDED"),
            ExecutionPhase::Failed(FailureKind::Timeout) => f.write_str("FAILED(TIMEOUT)"),
            ExecutionPhase::Failed(FailureKind::Exception) => f.write_str("FAILED(EXCEPTION)"),
        }
    }
}

/// Result of [`ScriptEngine::run_table_script`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Updated row, or the row as given when the run failed
    pub doc: Row,
}

/// Normalizes, binds and runs table scripts.
pub struct ScriptEngine {
    executor: Arc<SandboxExecutor>,
    mailer: Arc<dyn EmailSender>,
    email: EmailConfig,
}

impl ScriptEngine {
    /// Creates a new engine from the platform configuration.
    pub fn new(config: &PlatformConfig, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            executor: Arc::new(SandboxExecutor::new(config.script.clone())),
            mailer,
            email: config.email.clone(),
        }
    }

    pub fn executor(&self) -> &SandboxExecutor {
        &self.executor
    }

    /// Runs a table script against a row.
    ///
    /// # Arguments
    /// * `code` - Script text as the author wrote it
    /// * `doc` - Row the script runs against
    /// * `table_slug` - Slug used to name field variables; empty binds none
    /// * `field_slugs` - Live field slugs of the table
    /// * `context` - Values exposed as context globals
    ///
    /// # Returns
    /// `ScriptOutcome`. A failed run carries its error message and the row
    /// exactly as given.
    pub async fn run_table_script(
        &self,
        code: &str,
        doc: &Row,
        table_slug: &str,
        field_slugs: &[String],
        context: ScriptContext,
    ) -> ScriptOutcome {
        let label = context
            .execution_moment
            .map_or("script", |moment| moment.as_str());
        let mut phase = ExecutionPhase::Idle;
        debug!("Table script '{}' {}: {}", table_slug, label, phase);

        if code.trim().is_empty() {
            return ScriptOutcome {
                success: true,
                error: None,
                doc: doc.clone(),
            };
        }

        phase = ExecutionPhase::Normalizing;
        debug!("Table script '{}' {}: {}", table_slug, label, phase);
        let normalized = normalizer::normalize(code);

        phase = ExecutionPhase::Binding;
        debug!("Table script '{}' {}: {}", table_slug, label, phase);
        let bound = binder::bind(&normalized, doc, table_slug, field_slugs);

        phase = ExecutionPhase::Running;
        debug!("Table script '{}' {}: {}", table_slug, label, phase);
        let sandbox = Sandbox {
            doc: doc.clone(),
            context,
            bindings: bound.bindings,
        };
        let executor = self.executor.clone();
        let bound_code = bound.code;
        let result = match tokio::task::spawn_blocking(move || {
            executor.execute(&bound_code, sandbox)
        })
        .await
        {
            Ok(result) => result,
            Err(err) => ExecutionResult::failed(doc.clone(), &ScriptError::Worker(err.to_string())),
        };

        if result.success {
            phase = ExecutionPhase::Succeeded;
            debug!("Table script '{}' {}: {}", table_slug, label, phase);
            self.dispatch(result.emails).await;
            return ScriptOutcome {
                success: true,
                error: None,
                doc: result.doc,
            };
        }

        let message = result.error.unwrap_or_default();
        let kind = if result.timed_out {
            FailureKind::Timeout
        } else {
            FailureKind::Exception
        };
        phase = ExecutionPhase::Failed(kind);
        debug!("Table script '{}' {}: {}", table_slug, label, phase);
        warn!("Table script '{}' {} failed: {}", table_slug, label, message);

        ScriptOutcome {
            success: false,
            error: Some(message),
            doc: result.doc,
        }
    }

    /// Hands queued emails to the sender. Delivery failures are logged only.
    async fn dispatch(&self, emails: Vec<EmailRequest>) {
        for request in emails {
            let message = request.into_message(&self.email.from);
            let recipients = message.to.join(", ");
            if let Err(err) = self.mailer.send_email(message).await {
                warn!("Failed to send script email to {}: {}", recipients, err);
            }
        }
    }
}
