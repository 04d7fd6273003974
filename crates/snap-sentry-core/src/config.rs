use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How sibling sets are derived from the reported duplicate pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Union of the two endpoints' partners for every reported pair.
    /// Siblings are at most two pairs away.
    #[default]
    Pairwise,
    /// Full connected component over all reported pairs.
    Transitive,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub snapraid_binary: String,
    pub snapraid_config: String,
    pub storage_root: String,
    pub delete_threshold: i64,
    pub not_important: Vec<String>,
    pub script_path: String,
    pub log_file: Option<String>,
    pub log_max_size_kb: u64,
    pub log_backups: usize,
    pub grouping: GroupingMode,
    pub slow_stage_warn_ms: u64,
}

pub const DEFAULT_NOT_IMPORTANT: [&str; 5] = [
    "RAID/AppData/big-bear-trilium",
    "RAID/AppData/photoprism",
    "RAID/AppData/jellyfin",
    "RAID/AppData/big-bear-libretranslate",
    "RAID/AppData/big-bear-minio",
];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapraid_binary: "/usr/local/bin/snapraid".to_string(),
            snapraid_config: "/etc/snapraid.conf".to_string(),
            storage_root: "/mnt/Storage1-1".to_string(),
            delete_threshold: 100,
            not_important: DEFAULT_NOT_IMPORTANT.iter().map(|s| s.to_string()).collect(),
            script_path: "snap.sh".to_string(),
            log_file: Some("/var/log/snap.log".to_string()),
            log_max_size_kb: 5000,
            log_backups: 9,
            grouping: GroupingMode::Pairwise,
            slow_stage_warn_ms: 250,
        }
    }
}

/// Load configuration from defaults, then `Config.toml` (or `path` when
/// given), then `SNAP_SENTRY_*` environment variables.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .set_default("snapraid_binary", defaults.snapraid_binary)?
        .set_default("snapraid_config", defaults.snapraid_config)?
        .set_default("storage_root", defaults.storage_root)?
        .set_default("delete_threshold", defaults.delete_threshold)?
        .set_default("not_important", defaults.not_important)?
        .set_default("script_path", defaults.script_path)?
        .set_default("log_file", defaults.log_file)?
        .set_default("log_max_size_kb", defaults.log_max_size_kb)?
        .set_default("log_backups", defaults.log_backups as u64)?
        .set_default("grouping", "pairwise")?
        .set_default("slow_stage_warn_ms", defaults.slow_stage_warn_ms)?
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("SNAP_SENTRY")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("not_important"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
