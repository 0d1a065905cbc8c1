//! Traffic class record as exchanged with the persistence collaborator

use crate::condition::{render_root, ClassId, Condition};
use crate::error::{ClassError, Result};
use serde::{Deserialize, Serialize};

/// Identifier of the site owning a traffic class
pub type SiteId = u32;

/// A named traffic class with its condition tree.
///
/// A non-empty `cond_str` is a raw expression override; the persistence
/// collaborator resolves it in preference to `cond`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficClass {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClassId>,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Cond", default)]
    pub cond: Option<Condition>,
    #[serde(rename = "CondStr", default)]
    pub cond_str: String,
}

impl TrafficClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_cond(mut self, cond: Condition) -> Self {
        self.cond = Some(cond);
        self
    }

    /// Canonical expression of the structured tree, empty without one
    pub fn condition_string(&self) -> String {
        render_root(self.cond.as_ref())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClassError::Decode(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ClassError::Encode(e.to_string()))
    }
}
