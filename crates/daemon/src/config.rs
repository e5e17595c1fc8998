//! Partition configuration: a file (`partition.toml`, optional) layered under
//! `SEMANTICA_*` environment variables, the way the rest of the pack loads
//! its daemon config.

use serde::Deserialize;

const DEFAULT_PARTITION_DIR: &str = "~/.semantica/partition-0";

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionConfig {
    #[serde(default = "default_partition_dir")]
    pub partition_dir: String,

    /// Engine memory budget in MiB (§4.3 default is 512 MiB).
    pub memory_budget_mb: Option<u64>,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_partition_dir() -> String {
    DEFAULT_PARTITION_DIR.to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl PartitionConfig {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("partition").required(false))
            .add_source(config::Environment::with_prefix("SEMANTICA").separator("__"))
            .build()?;

        Ok(settings.try_deserialize::<PartitionConfigRaw>()?.into())
    }

    pub fn resolved_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(shellexpand::tilde(&self.partition_dir).into_owned())
    }

    pub fn memory_budget_bytes(&self) -> Option<usize> {
        self.memory_budget_mb.map(|mb| (mb as usize) * 1024 * 1024)
    }
}

/// Mirrors `PartitionConfig` field-for-field; exists only so `config`'s
/// deserializer doesn't have to fight our `Default`-providing `serde(default)`
/// annotations combined with a fully-optional source set.
#[derive(Debug, Clone, Deserialize, Default)]
struct PartitionConfigRaw {
    partition_dir: Option<String>,
    memory_budget_mb: Option<u64>,
    log_format: Option<String>,
}

impl From<PartitionConfigRaw> for PartitionConfig {
    fn from(raw: PartitionConfigRaw) -> Self {
        PartitionConfig {
            partition_dir: raw.partition_dir.unwrap_or_else(default_partition_dir),
            memory_budget_mb: raw.memory_budget_mb,
            log_format: raw.log_format.unwrap_or_else(default_log_format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(partition_dir: &str, memory_budget_mb: Option<u64>) -> PartitionConfig {
        PartitionConfig {
            partition_dir: partition_dir.to_string(),
            memory_budget_mb,
            log_format: default_log_format(),
        }
    }

    #[test]
    fn resolved_dir_expands_tilde() {
        let cfg = config("~/.semantica/partition-0", None);
        let home = std::env::var("HOME").unwrap_or_default();
        assert!(cfg.resolved_dir().starts_with(home));
    }

    #[test]
    fn memory_budget_converts_mib_to_bytes() {
        let cfg = config("/tmp/x", Some(256));
        assert_eq!(cfg.memory_budget_bytes(), Some(256 * 1024 * 1024));
    }

    #[test]
    fn memory_budget_absent_by_default() {
        let cfg = config("/tmp/x", None);
        assert_eq!(cfg.memory_budget_bytes(), None);
    }
}
