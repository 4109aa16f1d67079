//! Configuration for the deposit box
//!
//! Loading never fails on a bad value: every malformed field is logged and
//! replaced by its default, and the remaining fields are still honoured.

use crate::storage::is_valid_key;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::{Table, Value};

/// Deposit box configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for the ledger and claim documents
    pub data_dir: PathBuf,

    /// Item type credited on deposit
    pub deposit_item_id: i32,

    /// Skin id marking a container as a deposit box
    pub deposit_box_skin_id: u64,

    /// Storage key of the ledger document
    pub ledger_key: String,

    /// Storage key of the claim allocation output
    pub claims_key: String,

    /// Webhook configuration
    pub webhook: WebhookConfig,

    /// Leaderboard export configuration
    pub leaderboard: LeaderboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/depositbox"),
            deposit_item_id: -1779183908,      // paper
            deposit_box_skin_id: 1641384897,
            ledger_key: "DepositBoxLog".to_string(),
            claims_key: "DepositBoxClaims".to_string(),
            webhook: WebhookConfig::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

/// Webhook configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint; notifications are disabled when unset
    pub url: Option<String>,

    /// Display name sent with each message
    pub username: Option<String>,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            timeout_secs: 10,
            headers: BTreeMap::new(),
        }
    }
}

/// Candidate location of the external leaderboard document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTarget {
    /// Path of the JSON document
    pub path: PathBuf,

    /// Console command that makes the owner reload the document
    pub reload_command: Option<String>,
}

/// Leaderboard export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Enable the periodic export
    pub enabled: bool,

    /// Number of depositors listed
    pub top_n: usize,

    /// Entries per rendered page
    pub page_size: usize,

    /// Export interval (minutes)
    pub export_interval_mins: u64,

    /// Label marking the exported section
    pub section_label: String,

    /// Name of the list of sections inside the document
    pub sections_field: String,

    /// Field of a section holding its label
    pub label_field: String,

    /// Candidate documents, first existing one wins
    pub targets: Vec<DocumentTarget>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_n: 10,
            page_size: 10,
            export_interval_mins: 30,
            section_label: "Deposit Leaderboard".to_string(),
            sections_field: "Tabs".to_string(),
            label_field: "ButtonText".to_string(),
            targets: vec![
                DocumentTarget {
                    path: PathBuf::from("oxide/config/ServerInfo.json"),
                    reload_command: Some("oxide.reload ServerInfo".to_string()),
                },
                DocumentTarget {
                    path: PathBuf::from("carbon/configs/ServerInfo.json"),
                    reload_command: Some("c.reload ServerInfo".to_string()),
                },
            ],
        }
    }
}

impl Config {
    /// Load from file, writing the defaults first if it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Creating a new configuration file at {}", path.display());
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        Self::from_file(path)
    }

    /// Load from file
    ///
    /// Only an unreadable file or invalid TOML syntax is an error; bad
    /// values fall back to their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let table: Table = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(Self::from_table(&table))
    }

    /// Build from a parsed TOML table, field by field
    pub fn from_table(table: &Table) -> Self {
        let defaults = Config::default();
        let empty = Table::new();

        let webhook_table = section(table, "webhook").unwrap_or(&empty);
        let leaderboard_table = section(table, "leaderboard").unwrap_or(&empty);

        let webhook = WebhookConfig {
            url: field(webhook_table, "webhook.url", "url", defaults.webhook.url),
            username: field(
                webhook_table,
                "webhook.username",
                "username",
                defaults.webhook.username,
            ),
            timeout_secs: integer_field(
                webhook_table,
                "webhook.timeout_secs",
                "timeout_secs",
                defaults.webhook.timeout_secs,
            ),
            headers: field(
                webhook_table,
                "webhook.headers",
                "headers",
                defaults.webhook.headers,
            ),
        };

        let lb = defaults.leaderboard;
        let leaderboard = LeaderboardConfig {
            enabled: bool_field(leaderboard_table, "leaderboard.enabled", "enabled", lb.enabled),
            top_n: integer_field(leaderboard_table, "leaderboard.top_n", "top_n", lb.top_n),
            page_size: integer_field(
                leaderboard_table,
                "leaderboard.page_size",
                "page_size",
                lb.page_size,
            ),
            export_interval_mins: integer_field(
                leaderboard_table,
                "leaderboard.export_interval_mins",
                "export_interval_mins",
                lb.export_interval_mins,
            ),
            section_label: field(
                leaderboard_table,
                "leaderboard.section_label",
                "section_label",
                lb.section_label,
            ),
            sections_field: field(
                leaderboard_table,
                "leaderboard.sections_field",
                "sections_field",
                lb.sections_field,
            ),
            label_field: field(
                leaderboard_table,
                "leaderboard.label_field",
                "label_field",
                lb.label_field,
            ),
            targets: field(leaderboard_table, "leaderboard.targets", "targets", lb.targets),
        };

        let mut config = Config {
            data_dir: field(table, "data_dir", "data_dir", defaults.data_dir),
            deposit_item_id: integer_field(
                table,
                "deposit_item_id",
                "deposit_item_id",
                defaults.deposit_item_id,
            ),
            deposit_box_skin_id: integer_field(
                table,
                "deposit_box_skin_id",
                "deposit_box_skin_id",
                defaults.deposit_box_skin_id,
            ),
            ledger_key: field(table, "ledger_key", "ledger_key", defaults.ledger_key),
            claims_key: field(table, "claims_key", "claims_key", defaults.claims_key),
            webhook,
            leaderboard,
        };

        config.sanitize();
        config
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `DEPOSITBOX_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(data_dir) = std::env::var("DEPOSITBOX_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(url) = std::env::var("DEPOSITBOX_WEBHOOK_URL") {
            self.webhook.url = if url.trim().is_empty() { None } else { Some(url) };
        }
    }

    /// Write as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Zero sizes break pagination and the export timer; bad keys break storage.
    fn sanitize(&mut self) {
        let lb_defaults = LeaderboardConfig::default();

        if self.leaderboard.page_size == 0 {
            tracing::warn!(
                "leaderboard.page_size must be positive, using default {}",
                lb_defaults.page_size
            );
            self.leaderboard.page_size = lb_defaults.page_size;
        }

        if self.leaderboard.export_interval_mins == 0 {
            tracing::warn!(
                "leaderboard.export_interval_mins must be positive, using default {}",
                lb_defaults.export_interval_mins
            );
            self.leaderboard.export_interval_mins = lb_defaults.export_interval_mins;
        }

        let defaults = Config::default();
        if !is_valid_key(&self.ledger_key) {
            tracing::warn!(
                "Invalid ledger_key '{}', using default {}",
                self.ledger_key,
                defaults.ledger_key
            );
            self.ledger_key = defaults.ledger_key;
        }

        if !is_valid_key(&self.claims_key) {
            tracing::warn!(
                "Invalid claims_key '{}', using default {}",
                self.claims_key,
                defaults.claims_key
            );
            self.claims_key = defaults.claims_key;
        }

        if self.webhook.url.as_deref().map(str::trim) == Some("") {
            self.webhook.url = None;
        }
    }
}

fn section<'a>(table: &'a Table, key: &str) -> Option<&'a Table> {
    match table.get(key) {
        Some(Value::Table(inner)) => Some(inner),
        Some(other) => {
            tracing::warn!(
                "Config section '{}' should be a table, found {}; using defaults",
                key,
                other.type_str()
            );
            None
        }
        None => None,
    }
}

fn field<T: DeserializeOwned>(table: &Table, name: &str, key: &str, default: T) -> T {
    match table.get(key) {
        None => default,
        Some(value) => match value.clone().try_into::<T>() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid config value for '{}' ({}); using default", name, e);
                default
            }
        },
    }
}

// Integers may also be written as numeric strings.
fn integer_field<T>(table: &Table, name: &str, key: &str, default: T) -> T
where
    T: TryFrom<i64> + FromStr + Display + Copy,
{
    let parsed = match table.get(key) {
        None => return default,
        Some(Value::Integer(raw)) => T::try_from(*raw).ok(),
        Some(Value::String(raw)) => raw.trim().parse::<T>().ok(),
        Some(_) => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!(
            "Invalid numeric config value for '{}'; using default {}",
            name,
            default
        );
        default
    })
}

fn bool_field(table: &Table, name: &str, key: &str, default: bool) -> bool {
    let parsed = match table.get(key) {
        None => return default,
        Some(Value::Boolean(raw)) => Some(*raw),
        Some(Value::String(raw)) => raw.trim().to_ascii_lowercase().parse::<bool>().ok(),
        Some(_) => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!(
            "Invalid boolean config value for '{}'; using default {}",
            name,
            default
        );
        default
    })
}
