// ==========================================
// 教务管理系统 - 导入配置快照
// ==========================================
// 职责: 单次导入使用的配置值（导入开始时解析一次）
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::config_keys;
use crate::importer::error::{ImportError, ImportOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_REPOSITORY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_ALL_CONFLICTS_FAIL: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub repository_timeout_ms: u64,
    pub all_conflicts_fail: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            repository_timeout_ms: DEFAULT_REPOSITORY_TIMEOUT_MS,
            all_conflicts_fail: DEFAULT_ALL_CONFLICTS_FAIL,
        }
    }
}

impl ImportConfig {
    /// 从配置读取器解析快照并校验
    pub async fn load<C: ImportConfigReader + ?Sized>(reader: &C) -> ImportOutcome<Self> {
        let config = Self {
            batch_size: reader.get_batch_size().await?,
            repository_timeout_ms: reader.get_repository_timeout_ms().await?,
            all_conflicts_fail: reader.get_all_conflicts_fail().await?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ImportOutcome<()> {
        if self.batch_size == 0 {
            return Err(ImportError::ConfigValueError {
                key: config_keys::IMPORT_BATCH_SIZE.to_string(),
                value: self.batch_size.to_string(),
                message: "batch size must be at least 1".to_string(),
            });
        }
        if self.repository_timeout_ms == 0 {
            return Err(ImportError::ConfigValueError {
                key: config_keys::IMPORT_REPOSITORY_TIMEOUT_MS.to_string(),
                value: self.repository_timeout_ms.to_string(),
                message: "repository timeout must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn repository_timeout(&self) -> Duration {
        Duration::from_millis(self.repository_timeout_ms)
    }
}

#[async_trait]
impl ImportConfigReader for ImportConfig {
    async fn get_batch_size(&self) -> ImportOutcome<usize> {
        Ok(self.batch_size)
    }

    async fn get_repository_timeout_ms(&self) -> ImportOutcome<u64> {
        Ok(self.repository_timeout_ms)
    }

    async fn get_all_conflicts_fail(&self) -> ImportOutcome<bool> {
        Ok(self.all_conflicts_fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.repository_timeout(), Duration::from_secs(30));
        assert!(config.all_conflicts_fail);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = ImportConfig {
            batch_size: 0,
            ..ImportConfig::default()
        };

        match config.validate() {
            Err(ImportError::ConfigValueError { key, .. }) => {
                assert_eq!(key, config_keys::IMPORT_BATCH_SIZE)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_from_fixed_config() {
        let fixed = ImportConfig {
            batch_size: 2,
            repository_timeout_ms: 500,
            all_conflicts_fail: false,
        };

        let loaded = ImportConfig::load(&fixed).await.unwrap();
        assert_eq!(loaded, fixed);
    }
}
