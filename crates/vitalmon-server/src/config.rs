use serde::{Deserialize, Serialize};
use std::path::Path;
use vitalmon_notify::channels::SmtpSettings;
use vitalmon_storage::DedupPolicy;

/// Upper bound for configured time windows, in seconds (one leap year).
pub const MAX_WINDOW_SECS: u64 = 366 * 24 * 3600;

/// Upper bound for `active_subject_lookback_days`.
pub const MAX_LOOKBACK_DAYS: u32 = 366;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub instance: InstanceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// Snowflake identity of this process. Instances sharing a database need
/// distinct pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default = "default_instance_part")]
    pub machine_id: i32,
    #[serde(default = "default_instance_part")]
    pub node_id: i32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            machine_id: default_instance_part(),
            node_id: default_instance_part(),
        }
    }
}

fn default_instance_part() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Full connection URL; defaults to a SQLite file inside `data_dir`.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            url: None,
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => vitalmon_storage::store::sqlite_url(Path::new(&self.data_dir)),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Seconds between scheduled evaluation cycles.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Subjects evaluated in parallel per cycle.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Run the pattern, missed-reading and positive generators on every
    /// ingested reading, not only on scheduled cycles.
    #[serde(default = "default_full_pass_on_ingest")]
    pub full_pass_on_ingest: bool,
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,
    #[serde(default = "default_title_window_secs")]
    pub title_window_secs: u64,
    /// Subjects with readings in this many days are evaluated each cycle.
    #[serde(default = "default_active_subject_lookback_days")]
    pub active_subject_lookback_days: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            max_concurrent: default_max_concurrent(),
            full_pass_on_ingest: default_full_pass_on_ingest(),
            dedup_window_secs: default_dedup_window_secs(),
            title_window_secs: default_title_window_secs(),
            active_subject_lookback_days: default_active_subject_lookback_days(),
        }
    }
}

impl EvaluationConfig {
    pub fn dedup_policy(&self) -> DedupPolicy {
        DedupPolicy {
            severity_window: bounded_window(self.dedup_window_secs),
            title_window: bounded_window(self.title_window_secs),
        }
    }

    pub fn active_subject_lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(
            self.active_subject_lookback_days.min(MAX_LOOKBACK_DAYS),
        ))
    }
}

fn bounded_window(secs: u64) -> chrono::Duration {
    // Lossless after the clamp.
    chrono::Duration::seconds(secs.min(MAX_WINDOW_SECS) as i64)
}

fn default_tick_secs() -> u64 {
    900
}

fn default_max_concurrent() -> usize {
    8
}

fn default_full_pass_on_ingest() -> bool {
    true
}

fn default_dedup_window_secs() -> u64 {
    6 * 3600
}

fn default_title_window_secs() -> u64 {
    24 * 3600
}

fn default_active_subject_lookback_days() -> u32 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// SMTP send attempts per email.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_smtp_from")]
    pub from: String,
    #[serde(default)]
    pub starttls: bool,
    #[serde(default)]
    pub implicit_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from: default_smtp_from(),
            starttls: false,
            implicit_tls: false,
        }
    }
}

impl SmtpConfig {
    pub fn settings(&self, max_attempts: u32) -> SmtpSettings {
        SmtpSettings {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            from: self.from.clone(),
            starttls: self.starttls,
            implicit_tls: self.implicit_tls,
            max_attempts,
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_smtp_from() -> String {
    "Vitalmon <alerts@localhost>".to_string()
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
