// ==========================================
// 教务管理系统 - 导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::import::ImportBatchRecord;
use crate::domain::records::ImportRecord;
use crate::domain::types::ImportTarget;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_repo::ImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 允许写入的基础数据表
const TABLE_TARGETS: &[(&str, ImportTarget)] = &[
    ("academic_levels", ImportTarget::AcademicLevel),
    ("subjects", ImportTarget::Subject),
    ("grades", ImportTarget::Grade),
];

fn table_target(table: &str) -> RepositoryResult<ImportTarget> {
    TABLE_TARGETS
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, target)| *target)
        .ok_or_else(|| RepositoryError::UnknownTable(table.to_string()))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

// ==========================================
// SqliteImportRepository
// ==========================================
pub struct SqliteImportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteImportRepository {
    /// 创建新的 Repository 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA 与建表，均为幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 在阻塞线程池中持锁执行数据库操作
    ///
    /// 连接锁与 SQLite 调用都不占用异步工作线程，调用方的 tokio::time::timeout 才能按时返回。
    /// 超时后该任务仍会执行完毕（包括提交），此时由 UNIQUE 约束兜底重复写入。
    async fn with_connection<T, F>(&self, op: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RepositoryResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|e| RepositoryError::InternalError(format!("blocking task failed: {}", e)))?
    }

    /// 在事务中批量插入
    fn insert_many_tx(
        tx: &Transaction,
        table: &str,
        records: &[ImportRecord],
        created_at: &str,
    ) -> RepositoryResult<usize> {
        let expected = table_target(table)?;

        let mut count = 0;
        for record in records {
            if record.target() != expected {
                return Err(RepositoryError::TargetMismatch {
                    table: table.to_string(),
                    target: record.target().to_string(),
                });
            }

            let columns = record.to_columns();
            let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
            let placeholders: Vec<String> =
                (1..=columns.len() + 1).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}, created_at) VALUES ({})",
                table,
                names.join(", "),
                placeholders.join(", ")
            );

            let mut values: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
            values.push(Value::Text(created_at.to_string()));

            let mut stmt = tx.prepare_cached(&sql)?;
            stmt.execute(params_from_iter(values.iter()))?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl ImportRepository for SqliteImportRepository {
    async fn select_keys(&self, table: &str, key_field: &str) -> RepositoryResult<HashSet<String>> {
        table_target(table)?;
        if !is_identifier(key_field) {
            return Err(RepositoryError::DatabaseQueryError(format!(
                "invalid key field: {}",
                key_field
            )));
        }

        let sql = format!("SELECT {} FROM {}", key_field, table);
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut keys = HashSet::new();
            for row in rows {
                keys.insert(row?);
            }

            Ok(keys)
        })
        .await
    }

    /// 批量插入（事务化，整批成功或整批回滚）
    async fn insert_many(&self, table: &str, records: &[ImportRecord]) -> RepositoryResult<usize> {
        let table = table.to_string();
        let records = records.to_vec();

        self.with_connection(move |conn| {
            let tx = conn.unchecked_transaction()?;

            let created_at = Utc::now().to_rfc3339();
            let count = Self::insert_many_tx(&tx, &table, &records, &created_at)?;

            tx.commit()?;
            Ok(count)
        })
        .await
    }

    async fn record_import_batch(&self, batch: &ImportBatchRecord) -> RepositoryResult<()> {
        let batch = batch.clone();
        self.with_connection(move |conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO import_batch (
                    import_id, target, total_rows, imported, skipped, error_count,
                    success, elapsed_ms, imported_at, errors_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    batch.import_id,
                    batch.target.as_str(),
                    batch.total_rows as i64,
                    batch.imported as i64,
                    batch.skipped as i64,
                    batch.error_count as i64,
                    batch.success as i32,
                    batch.elapsed_ms,
                    batch.imported_at.to_rfc3339(),
                    batch.errors_json,
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{Grade, Subject};
    use std::time::Duration;

    fn repo() -> SqliteImportRepository {
        let conn = Connection::open_in_memory().unwrap();
        SqliteImportRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn subject(code: &str) -> ImportRecord {
        ImportRecord::Subject(Subject {
            name: "Analyse".to_string(),
            code: code.to_string(),
            coefficient: 2.0,
            credits_ects: 5,
            hours_total: Some(42),
            semester: None,
            level_code: Some("L1".to_string()),
        })
    }

    #[tokio::test]
    async fn test_insert_and_select_keys() {
        let repo = repo();

        let inserted = repo
            .insert_many("subjects", &[subject("AN1"), subject("AN2")])
            .await
            .unwrap();
        let keys = repo.select_keys("subjects", "code").await.unwrap();

        assert_eq!(inserted, 2);
        assert!(keys.contains("AN1"));
        assert!(keys.contains("AN2"));
    }

    #[tokio::test]
    async fn test_insert_many_rolls_back_whole_call() {
        let repo = repo();
        repo.insert_many("subjects", &[subject("AN1")]).await.unwrap();

        // 第二条触发 UNIQUE 约束，本次调用整体回滚
        let result = repo
            .insert_many("subjects", &[subject("AN2"), subject("AN1")])
            .await;
        let keys = repo.select_keys("subjects", "code").await.unwrap();

        assert!(matches!(
            result,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
        assert_eq!(keys.len(), 1);
        assert!(!keys.contains("AN2"));
    }

    #[tokio::test]
    async fn test_insert_many_rejects_target_mismatch() {
        let repo = repo();
        let grade = ImportRecord::Grade(Grade {
            name: "Bien".to_string(),
            code: "B".to_string(),
            min_score: 14.0,
            max_score: 16.0,
            grade_points: Some(3.0),
        });

        let result = repo.insert_many("subjects", &[grade]).await;

        assert!(matches!(result, Err(RepositoryError::TargetMismatch { .. })));
    }

    #[tokio::test]
    async fn test_insert_many_timeout_fires_while_connection_busy() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = SqliteImportRepository::from_connection(Arc::clone(&conn)).unwrap();

        // 连接被其他调用方占用：超时必须能在持锁期间返回
        let guard = conn.lock().unwrap();
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            repo.insert_many("subjects", &[subject("AN1")]),
        )
        .await;
        drop(guard);

        assert!(result.is_err());
        let inserted = repo.insert_many("subjects", &[subject("AN2")]).await.unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_select_keys_unknown_table() {
        let repo = repo();
        let result = repo.select_keys("students", "code").await;
        assert!(matches!(result, Err(RepositoryError::UnknownTable(_))));
    }
}
