//! Leaderboard merge into the external display document
//!
//! The display document is owned by another plugin. It is a JSON object
//! holding a list of sections (tabs); this module only ever touches the
//! section whose label equals the configured marker:
//!
//! ```text
//! {
//!   "Tabs": [
//!     { "ButtonText": "Rules", ... },                 <- untouched
//!     { "ButtonText": "Deposit Leaderboard",          <- replaced
//!       "HeaderText": "Deposit Leaderboard",
//!       "Pages": [ { "TextLines": ["1. Alice - 8", ...] } ] }
//!   ],
//!   ...                                               <- untouched
//! }
//! ```
//!
//! Key order is preserved on rewrite. The first candidate path that exists
//! is used, and its reload command (if any) is reported back to the caller.

use crate::{leaderboard::Leaderboard, Error, Result};
use depositbox_ledger::{DocumentTarget, LeaderboardConfig};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;

const HEADER_FIELD: &str = "HeaderText";
const PAGES_FIELD: &str = "Pages";
const LINES_FIELD: &str = "TextLines";
const EMPTY_LINE: &str = "No deposits yet.";

/// What the merge did to the section list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// A previously exported section was replaced
    Replaced,

    /// No previous section existed; the new one was appended
    Inserted,
}

/// Result of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Document that was rewritten
    pub path: PathBuf,

    /// Replace or insert
    pub action: MergeAction,

    /// Ranked rows written
    pub entries: usize,

    /// Command the caller should run so the owner reloads the document
    pub reload_command: Option<String>,
}

/// First candidate document that exists
pub fn locate(targets: &[DocumentTarget]) -> Option<&DocumentTarget> {
    targets.iter().find(|target| target.path.is_file())
}

/// Build the section the exporter owns
pub fn build_section(config: &LeaderboardConfig, leaderboard: &Leaderboard) -> Value {
    let mut pages: Vec<Value> = leaderboard
        .rendered_pages()
        .into_iter()
        .map(|lines| json!({ LINES_FIELD: lines }))
        .collect();

    if pages.is_empty() {
        pages.push(json!({ LINES_FIELD: [EMPTY_LINE] }));
    }

    let mut section = Map::new();
    section.insert(
        config.label_field.clone(),
        Value::String(config.section_label.clone()),
    );
    section.insert(
        HEADER_FIELD.to_string(),
        Value::String(config.section_label.clone()),
    );
    section.insert(PAGES_FIELD.to_string(), Value::Array(pages));
    Value::Object(section)
}

/// Replace the marked section in `document`, or append it if absent
pub fn merge_section(
    document: &mut Value,
    config: &LeaderboardConfig,
    section: Value,
) -> Result<MergeAction> {
    let root = document.as_object_mut().ok_or_else(|| {
        Error::MalformedDocument("document root is not an object".to_string())
    })?;

    let sections = root
        .get_mut(&config.sections_field)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            Error::MalformedDocument(format!("missing '{}' list", config.sections_field))
        })?;

    let existing = sections.iter_mut().find(|candidate| {
        candidate
            .get(&config.label_field)
            .and_then(Value::as_str)
            .map_or(false, |label| label == config.section_label)
    });

    match existing {
        Some(slot) => {
            *slot = section;
            Ok(MergeAction::Replaced)
        }
        None => {
            sections.push(section);
            Ok(MergeAction::Inserted)
        }
    }
}

/// Merge `leaderboard` into the first existing target document
///
/// Missing or unparseable documents abort this export and leave every file
/// untouched.
pub fn export_leaderboard(
    config: &LeaderboardConfig,
    leaderboard: &Leaderboard,
) -> Result<ExportReport> {
    let target = locate(&config.targets).ok_or_else(|| {
        let tried: Vec<String> = config
            .targets
            .iter()
            .map(|target| target.path.display().to_string())
            .collect();
        Error::DocumentNotFound(tried.join(", "))
    })?;

    let content = fs::read_to_string(&target.path)?;
    let mut document: Value = serde_json::from_str(&content)?;

    let section = build_section(config, leaderboard);
    let action = merge_section(&mut document, config, section)?;

    let tmp_path = target.path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(&document)?)?;
    fs::rename(&tmp_path, &target.path)?;

    tracing::info!(
        path = %target.path.display(),
        entries = leaderboard.entries.len(),
        ?action,
        "Leaderboard exported"
    );

    Ok(ExportReport {
        path: target.path.clone(),
        action,
        entries: leaderboard.entries.len(),
        reload_command: target.reload_command.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::compute_leaderboard;
    use depositbox_ledger::{DepositorId, LedgerSnapshot};
    use std::path::Path;

    fn config_for(dir: &Path) -> LeaderboardConfig {
        LeaderboardConfig {
            targets: vec![
                DocumentTarget {
                    path: dir.join("oxide").join("ServerInfo.json"),
                    reload_command: Some("oxide.reload ServerInfo".to_string()),
                },
                DocumentTarget {
                    path: dir.join("carbon").join("ServerInfo.json"),
                    reload_command: Some("c.reload ServerInfo".to_string()),
                },
            ],
            ..LeaderboardConfig::default()
        }
    }

    fn board() -> Leaderboard {
        let snapshot = LedgerSnapshot::new(
            [("P1", 8u64), ("P2", 2u64)]
                .iter()
                .map(|(id, amount)| (DepositorId::new(*id), *amount))
                .collect(),
        );
        compute_leaderboard(&snapshot, 10, 10, |_| None)
    }

    fn write_doc(path: &Path, value: &Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_replaces_only_marked_section() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = config_for(temp_dir.path());
        let path = config.targets[1].path.clone();

        let rules = json!({ "ButtonText": "Rules", "Pages": [{ "TextLines": ["Be nice"] }] });
        write_doc(
            &path,
            &json!({
                "Position": { "MinX": 0.1 },
                "Tabs": [
                    rules.clone(),
                    { "ButtonText": "Deposit Leaderboard", "Pages": [{ "TextLines": ["old"] }] }
                ]
            }),
        );

        let report = export_leaderboard(&config, &board()).unwrap();
        assert_eq!(report.action, MergeAction::Replaced);
        assert_eq!(report.path, path);
        assert_eq!(report.reload_command.as_deref(), Some("c.reload ServerInfo"));

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let tabs = written["Tabs"].as_array().unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0], rules);
        assert_eq!(tabs[1]["Pages"][0]["TextLines"][0], "1. P1 - 8");
        assert_eq!(written["Position"]["MinX"], 0.1);
    }

    #[test]
    fn test_inserts_when_absent_and_prefers_first_target() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = config_for(temp_dir.path());
        write_doc(&config.targets[0].path, &json!({ "Tabs": [] }));
        write_doc(&config.targets[1].path, &json!({ "Tabs": [] }));

        let report = export_leaderboard(&config, &board()).unwrap();
        assert_eq!(report.action, MergeAction::Inserted);
        assert_eq!(report.path, config.targets[0].path);

        let untouched = fs::read_to_string(&config.targets[1].path).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&untouched).unwrap(),
            json!({ "Tabs": [] })
        );
    }

    #[test]
    fn test_second_export_replaces_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = config_for(temp_dir.path());
        write_doc(&config.targets[0].path, &json!({ "Tabs": [{ "ButtonText": "Rules" }] }));

        assert_eq!(export_leaderboard(&config, &board()).unwrap().action, MergeAction::Inserted);
        assert_eq!(export_leaderboard(&config, &board()).unwrap().action, MergeAction::Replaced);

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&config.targets[0].path).unwrap()).unwrap();
        assert_eq!(written["Tabs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_document() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = config_for(temp_dir.path());

        let err = export_leaderboard(&config, &board()).unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
        assert!(err.is_external());
    }

    #[test]
    fn test_unparseable_document_left_alone() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = config_for(temp_dir.path());
        let path = &config.targets[0].path;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{ \"Tabs\": [").unwrap();

        let err = export_leaderboard(&config, &board()).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(fs::read_to_string(path).unwrap(), "{ \"Tabs\": [");
    }

    #[test]
    fn test_document_without_section_list() {
        let mut document = json!({ "Pages": [] });
        let config = LeaderboardConfig::default();
        let section = build_section(&config, &board());

        assert!(matches!(
            merge_section(&mut document, &config, section),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_empty_leaderboard_renders_placeholder() {
        let config = LeaderboardConfig::default();
        let section = build_section(&config, &Leaderboard::default());

        assert_eq!(section["ButtonText"], "Deposit Leaderboard");
        assert_eq!(section["Pages"][0]["TextLines"][0], EMPTY_LINE);
    }
}
