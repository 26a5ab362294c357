//! User scripts attached to a table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Script source of one table method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodCode {
    pub code: Option<String>,
}

impl MethodCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
        }
    }

    /// Script text, if it holds anything besides whitespace.
    pub fn script(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.trim().is_empty())
    }
}

/// Scripts run around row loads and saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableMethods {
    pub on_load: MethodCode,
    pub before_save: MethodCode,
    pub after_save: MethodCode,
}

impl TableMethods {
    /// Script configured for `moment`.
    pub fn script(&self, moment: ExecutionMoment) -> Option<&str> {
        match moment {
            ExecutionMoment::OnLoad => self.on_load.script(),
            ExecutionMoment::BeforeSave => self.before_save.script(),
            ExecutionMoment::AfterSave => self.after_save.script(),
        }
    }
}

/// Point in the row lifecycle at which a script runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMoment {
    OnLoad,
    BeforeSave,
    AfterSave,
}

impl ExecutionMoment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMoment::OnLoad => "onLoad",
            ExecutionMoment::BeforeSave => "beforeSave",
            ExecutionMoment::AfterSave => "afterSave",
        }
    }
}

impl fmt::Display for ExecutionMoment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row operation that triggered a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserAction {
    Create,
    Update,
    Load,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::Create => "create",
            UserAction::Update => "update",
            UserAction::Load => "load",
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
