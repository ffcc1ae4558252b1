//! Persistence round-trips: rules.json, visa_types.toml, and CSV.

use tempfile::TempDir;

use visa_counsel::config::VisaTypeConfig;
use visa_counsel::export;
use visa_counsel::loader::{self, RuleFile, RuleRecord};
use visa_counsel::validate;

fn sample_file() -> RuleFile {
    RuleFile {
        rules: vec![
            RuleRecord {
                conditions: vec![
                    "applicant works for a treaty-country company".into(),
                    "applicant qualifies as manager or essential skills".into(),
                ],
                action: "E-visa application is possible".into(),
                is_or_rule: false,
                is_goal_action: true,
                visa_type: "E".into(),
                name: Some("E visa goal".into()),
            },
            RuleRecord {
                conditions: vec![
                    "applicant is an executive".into(),
                    "applicant supervises professional staff".into(),
                ],
                action: "applicant qualifies as manager or essential skills".into(),
                is_or_rule: true,
                is_goal_action: false,
                visa_type: "E".into(),
                name: None,
            },
            RuleRecord {
                conditions: vec!["stay is under 90 days".into()],
                action: "B-visa application is possible".into(),
                is_or_rule: false,
                is_goal_action: true,
                visa_type: "B".into(),
                name: None,
            },
        ],
        goal_actions: vec![
            "E-visa application is possible".into(),
            "B-visa application is possible".into(),
        ],
    }
}

#[test]
fn rules_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");

    let file = sample_file();
    file.save(&path).unwrap();
    let loaded = RuleFile::load(&path).unwrap();

    assert_eq!(loaded, file);
}

#[test]
fn loaded_catalog_indexes_match_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    sample_file().save(&path).unwrap();

    let catalog =
        loader::load_catalog(&path, VisaTypeConfig::from_codes(&["E", "B"])).unwrap();

    assert_eq!(catalog.len(), 3);
    assert!(catalog.is_derived("applicant qualifies as manager or essential skills"));
    assert!(!catalog.is_derived("applicant is an executive"));
    assert_eq!(catalog.goal_rules().len(), 2);
    // Goal order follows the configured visa order.
    assert_eq!(catalog.goal_rules()[0].visa_type, "E");
    assert_eq!(catalog.goal_rules()[1].visa_type, "B");
}

#[test]
fn csv_export_import_identity() {
    let records = sample_file().rules;
    let csv = export::export_csv(&records);
    let outcome = export::import_csv(&csv);

    assert!(outcome.is_clean(), "errors: {:?}", outcome.errors);
    assert_eq!(outcome.records, records);
}

#[test]
fn visa_types_toml_round_trip_and_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("visa_types.toml");

    let config = VisaTypeConfig::fallback();
    config.save(&path).unwrap();
    let loaded = VisaTypeConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.codes(), vec!["E", "L", "B", "H-1B", "J-1"]);

    // A catalogue built with this config and matching tags validates clean.
    let rules_path = dir.path().join("rules.json");
    sample_file().save(&rules_path).unwrap();
    let catalog = loader::load_catalog(&rules_path, loaded).unwrap();
    let issues = validate::check_catalog(&catalog);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn missing_rules_file_reports_read_error() {
    let dir = TempDir::new().unwrap();
    let err = RuleFile::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}
