//! File-backed rule store: `rules.json` load/save and catalogue assembly.
//!
//! The file is an ordered list of rule records plus the goal-action list.
//! Ordering is significant only for admin display and export; the engine
//! does not depend on it. Rule ids are synthesized from file order and are
//! stable per snapshot.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::VisaTypeConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::rule::Rule;

/// One persisted rule record, as stored in `rules.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub conditions: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub is_or_rule: bool,
    #[serde(default)]
    pub is_goal_action: bool,
    #[serde(default)]
    pub visa_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The full catalogue document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
    /// Goal conclusions by action string. When absent, the advisory
    /// `is_goal_action` flags are used instead.
    #[serde(default)]
    pub goal_actions: Vec<String>,
}

impl RuleFile {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write pretty JSON, preserving rule order.
    pub fn save(&self, path: &Path) -> CatalogResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| CatalogError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// The effective goal set: the explicit list, or the flagged actions.
    pub fn effective_goal_actions(&self) -> Vec<String> {
        if !self.goal_actions.is_empty() {
            return self.goal_actions.clone();
        }
        let mut goals = Vec::new();
        for record in &self.rules {
            if record.is_goal_action && !goals.contains(&record.action) {
                goals.push(record.action.clone());
            }
        }
        goals
    }
}

/// Materialize records into rules, synthesizing ids from file order.
pub fn build_rules(records: &[RuleRecord]) -> Vec<Rule> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| Rule {
            id: format!("R{:03}", idx + 1),
            name: record.name.clone().unwrap_or_else(|| record.action.clone()),
            conditions: record.conditions.clone(),
            action: record.action.clone(),
            is_or_rule: record.is_or_rule,
            visa_type: record.visa_type.clone(),
            is_goal_action: record.is_goal_action,
        })
        .collect()
}

/// Project rules back into persistable records (id is dropped).
pub fn to_records(rules: &[Rule]) -> Vec<RuleRecord> {
    rules
        .iter()
        .map(|rule| RuleRecord {
            conditions: rule.conditions.clone(),
            action: rule.action.clone(),
            is_or_rule: rule.is_or_rule,
            is_goal_action: rule.is_goal_action,
            visa_type: rule.visa_type.clone(),
            name: (rule.name != rule.action).then(|| rule.name.clone()),
        })
        .collect()
}

/// Load a complete catalogue snapshot from a rules file and visa config.
pub fn load_catalog(rules_path: &Path, visa_config: VisaTypeConfig) -> CatalogResult<Catalog> {
    let file = RuleFile::load(rules_path)?;
    let goal_actions = file.effective_goal_actions();
    let rules = build_rules(&file.rules);
    tracing::info!(
        rules = rules.len(),
        goals = goal_actions.len(),
        path = %rules_path.display(),
        "rule catalogue loaded"
    );
    Ok(Catalog::new(rules, goal_actions, visa_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> RuleFile {
        RuleFile {
            rules: vec![
                RuleRecord {
                    conditions: vec!["c1".into(), "c2".into()],
                    action: "goal".into(),
                    is_or_rule: false,
                    is_goal_action: true,
                    visa_type: "E".into(),
                    name: Some("E goal".into()),
                },
                RuleRecord {
                    conditions: vec!["c3".into()],
                    action: "c1".into(),
                    is_or_rule: true,
                    is_goal_action: false,
                    visa_type: "E".into(),
                    name: None,
                },
            ],
            goal_actions: vec!["goal".into()],
        }
    }

    #[test]
    fn json_round_trip_preserves_order_and_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        let file = sample_file();
        file.save(&path).unwrap();
        let loaded = RuleFile::load(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn missing_required_fields_fail_to_parse() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{"rules": [{"conditions": ["a"]}]}"#).unwrap();
        let err = RuleFile::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn ids_are_synthesized_from_file_order() {
        let rules = build_rules(&sample_file().rules);
        assert_eq!(rules[0].id, "R001");
        assert_eq!(rules[1].id, "R002");
        assert_eq!(rules[0].name, "E goal");
        assert_eq!(rules[1].name, "c1"); // defaults to the action
    }

    #[test]
    fn goal_actions_fall_back_to_flags() {
        let mut file = sample_file();
        file.goal_actions.clear();
        assert_eq!(file.effective_goal_actions(), vec!["goal".to_string()]);
    }

    #[test]
    fn records_round_trip_through_rules() {
        let records = sample_file().rules;
        assert_eq!(to_records(&build_rules(&records)), records);
    }
}
