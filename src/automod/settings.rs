//! Trigger settings schema
//!
//! Each trigger describes its configurable parameters as plain data. The
//! configuration panel and rule-storage layer consume this schema; nothing
//! in the engine renders it.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Value kind of a single setting
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKind {
    String,
    Int,
    Bool,
    /// Selector for a guild word/domain list
    List,
}

/// Typed default for a setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SettingValue {
    None,
    Int(i64),
    Bool(bool),
    Str(&'static str),
}

/// One configurable parameter of a trigger
#[derive(Debug, Clone, Serialize)]
pub struct SettingDef {
    /// Human-facing label
    pub name: &'static str,
    /// Key in the stored settings object
    pub key: &'static str,
    pub kind: SettingKind,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub default: SettingValue,
}

impl SettingDef {
    /// An integer setting bounded to `min..=max`
    #[must_use]
    pub fn int(name: &'static str, key: &'static str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name,
            key,
            kind: SettingKind::Int,
            min: Some(min),
            max: Some(max),
            default: SettingValue::Int(default),
        }
    }

    /// An unbounded string setting
    #[must_use]
    pub fn string(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            key,
            kind: SettingKind::String,
            min: None,
            max: None,
            default: SettingValue::Str(""),
        }
    }

    /// A boolean setting
    #[must_use]
    pub fn bool(name: &'static str, key: &'static str, default: bool) -> Self {
        Self {
            name,
            key,
            kind: SettingKind::Bool,
            min: None,
            max: None,
            default: SettingValue::Bool(default),
        }
    }

    /// A guild-list selector setting
    #[must_use]
    pub fn list(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            key,
            kind: SettingKind::List,
            min: None,
            max: None,
            default: SettingValue::None,
        }
    }
}
