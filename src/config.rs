//! Visa-type configuration: which visa types exist and in what order the
//! dialogue walks through them.
//!
//! Persisted as TOML (`visa_types.toml`). The order is injected into the
//! catalogue; the engine never hard-codes a visa list.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Order assigned to visa codes missing from the configuration.
pub const FALLBACK_ORDER: u32 = 99;

/// One configured visa type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaTypeDef {
    /// Short code used as the tag on rules (e.g. "E", "H-1B").
    pub code: String,
    /// Ask order: lower is asked first.
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The full visa-type configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaTypeConfig {
    #[serde(default)]
    pub visa_types: Vec<VisaTypeDef>,
}

impl VisaTypeConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&data).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let data = toml::to_string_pretty(self).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, data).map_err(|source| CatalogError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// The reference ordering shipped with the system, used when no
    /// configuration file is present.
    pub fn fallback() -> Self {
        let codes = ["E", "L", "B", "H-1B", "J-1"];
        Self {
            visa_types: codes
                .iter()
                .enumerate()
                .map(|(i, code)| VisaTypeDef {
                    code: (*code).to_string(),
                    order: i as u32,
                    name: None,
                    description: None,
                })
                .collect(),
        }
    }

    /// Build a config from bare codes in ask order. Test and tooling helper.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        Self {
            visa_types: codes
                .iter()
                .enumerate()
                .map(|(i, code)| VisaTypeDef {
                    code: code.as_ref().to_string(),
                    order: i as u32,
                    name: None,
                    description: None,
                })
                .collect(),
        }
    }

    /// Ask order of a code; unconfigured codes sort last.
    pub fn order_of(&self, code: &str) -> u32 {
        self.visa_types
            .iter()
            .find(|v| v.code == code)
            .map(|v| v.order)
            .unwrap_or(FALLBACK_ORDER)
    }

    pub fn get(&self, code: &str) -> Option<&VisaTypeDef> {
        self.visa_types.iter().find(|v| v.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Configured codes sorted by ask order (ties by code).
    pub fn codes(&self) -> Vec<&str> {
        let mut defs: Vec<&VisaTypeDef> = self.visa_types.iter().collect();
        defs.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.code.cmp(&b.code)));
        defs.into_iter().map(|v| v.code.as_str()).collect()
    }
}
