// ==========================================
// 教务管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config::{
    DEFAULT_ALL_CONFLICTS_FAIL, DEFAULT_BATCH_SIZE, DEFAULT_REPOSITORY_TIMEOUT_MS,
};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportOutcome};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportOutcome<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| read_error("connection", e))?;
        init_schema(&conn).map_err(|e| read_error("schema", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportOutcome<Self> {
        {
            let guard = lock(&conn)?;
            configure_sqlite_connection(&guard).map_err(|e| read_error("connection", e))?;
            init_schema(&guard).map_err(|e| read_error("schema", e))?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportOutcome<Option<String>> {
        let conn = lock(&self.conn)?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| read_error(key, e))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportOutcome<()> {
        let conn = lock(&self.conn)?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| read_error(key, e))?;

        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 随导入批次记录当时生效的配置
    pub fn get_config_snapshot(&self) -> ImportOutcome<String> {
        let conn = lock(&self.conn)?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(|e| read_error("snapshot", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| read_error("snapshot", e))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row.map_err(|e| read_error("snapshot", e))?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    /// 读取并解析配置值，缺失时使用默认值
    ///
    /// 格式错误时记录告警并回退到默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ImportOutcome<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, default = %default, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> ImportOutcome<usize> {
        self.get_parsed_or_default(config_keys::IMPORT_BATCH_SIZE, DEFAULT_BATCH_SIZE)
    }

    async fn get_repository_timeout_ms(&self) -> ImportOutcome<u64> {
        self.get_parsed_or_default(
            config_keys::IMPORT_REPOSITORY_TIMEOUT_MS,
            DEFAULT_REPOSITORY_TIMEOUT_MS,
        )
    }

    async fn get_all_conflicts_fail(&self) -> ImportOutcome<bool> {
        let Some(raw) = self.get_global_config_value(config_keys::IMPORT_ALL_CONFLICTS_FAIL)?
        else {
            return Ok(DEFAULT_ALL_CONFLICTS_FAIL);
        };

        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => {
                warn!(
                    config_key = config_keys::IMPORT_ALL_CONFLICTS_FAIL,
                    raw_value = %raw,
                    "配置值格式错误，使用默认值"
                );
                Ok(DEFAULT_ALL_CONFLICTS_FAIL)
            }
        }
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> ImportOutcome<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| ImportError::ConfigReadError {
        key: "connection".to_string(),
        message: format!("lock poisoned: {}", e),
    })
}

fn read_error(key: &str, err: rusqlite::Error) -> ImportError {
    ImportError::ConfigReadError {
        key: key.to_string(),
        message: err.to_string(),
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分批写入
    pub const IMPORT_BATCH_SIZE: &str = "import_batch_size";

    // 仓储调用超时（毫秒）
    pub const IMPORT_REPOSITORY_TIMEOUT_MS: &str = "import_repository_timeout_ms";

    // 全部冲突判定失败
    pub const IMPORT_ALL_CONFLICTS_FAIL: &str = "import_all_conflicts_fail";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let manager = manager();

        assert_eq!(manager.get_batch_size().await.unwrap(), 10);
        assert_eq!(manager.get_repository_timeout_ms().await.unwrap(), 30_000);
        assert!(manager.get_all_conflicts_fail().await.unwrap());
    }

    #[tokio::test]
    async fn test_override_and_malformed_value() {
        let manager = manager();
        manager
            .set_global_config_value(config_keys::IMPORT_BATCH_SIZE, "25")
            .unwrap();
        manager
            .set_global_config_value(config_keys::IMPORT_REPOSITORY_TIMEOUT_MS, "soon")
            .unwrap();
        manager
            .set_global_config_value(config_keys::IMPORT_ALL_CONFLICTS_FAIL, "false")
            .unwrap();

        assert_eq!(manager.get_batch_size().await.unwrap(), 25);
        assert_eq!(manager.get_repository_timeout_ms().await.unwrap(), 30_000);
        assert!(!manager.get_all_conflicts_fail().await.unwrap());
    }

    #[test]
    fn test_config_snapshot() {
        let manager = manager();
        manager
            .set_global_config_value(config_keys::IMPORT_BATCH_SIZE, "5")
            .unwrap();

        let snapshot: BTreeMap<String, String> =
            serde_json::from_str(&manager.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.get("import_batch_size").map(String::as_str), Some("5"));
    }
}
