// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、表格数据生成、内存仓储等功能
// ==========================================

#![allow(dead_code)]

use academic_import::db;
use academic_import::domain::{ImportBatchRecord, ImportRecord};
use academic_import::importer::CancellationFlag;
use academic_import::repository::{
    ImportRepository, RepositoryError, RepositoryResult, SqliteImportRepository,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::error::Error;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path is not valid UTF-8")?
        .to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接（与生产代码一致的 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(db::open_sqlite_connection(db_path)?)
}

/// 插入测试配置数据
pub fn insert_test_config(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let configs = vec![
        ("import_batch_size", "2"),
        ("import_repository_timeout_ms", "5000"),
        ("import_all_conflicts_fail", "true"),
    ];

    for (key, value) in configs {
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
    }

    Ok(())
}

/// 统计表内记录数
pub fn count_rows(db_path: &str, table: &str) -> Result<i64, Box<dyn Error>> {
    let conn = open_test_connection(db_path)?;
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

// ==========================================
// 表格数据生成
// ==========================================

pub const LEVEL_HEADER: &str = "Nom du niveau,Code,Cycle,Durée (années),Semestres,Ordre";
pub const SUBJECT_HEADER: &str = "Nom de la matière,Code matière,Coefficient,Crédits ECTS";
pub const GRADE_HEADER: &str = "Mention,Code,Note minimale,Note maximale";

/// 表头 + 数据行拼成 CSV
pub fn csv(header: &str, rows: &[&str]) -> Vec<u8> {
    let mut text = String::from(header);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text.into_bytes()
}

/// 成绩等级 CSV（每个代码一行，区间互不重叠）
pub fn grades_csv(codes: &[&str]) -> Vec<u8> {
    let rows: Vec<String> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| format!("Mention {},{},{},{}", code, code, i, i + 1))
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    csv(GRADE_HEADER, &refs)
}

// ==========================================
// MockImportRepository - 内存仓储
// ==========================================
// - existing: 已落库的键（insert_many 时作为唯一约束）
// - fail_keys: 包含这些键的批次整体失败
// - fail_select_keys: select_keys 返回错误（冲突预检被跳过）
#[derive(Default)]
pub struct MockImportRepository {
    pub existing: Mutex<HashSet<String>>,
    pub insert_calls: Mutex<Vec<Vec<String>>>,
    pub batches: Mutex<Vec<ImportBatchRecord>>,
    pub fail_keys: HashSet<String>,
    pub fail_select_keys: bool,
    pub cancel_on_first_insert: Option<CancellationFlag>,
}

impl MockImportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(keys: &[&str]) -> Self {
        let repo = Self::default();
        repo.existing
            .lock()
            .unwrap()
            .extend(keys.iter().map(|k| k.to_string()));
        repo
    }

    pub fn failing_on(mut self, keys: &[&str]) -> Self {
        self.fail_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn persisted(&self) -> HashSet<String> {
        self.existing.lock().unwrap().clone()
    }

    pub fn insert_call_count(&self) -> usize {
        self.insert_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImportRepository for MockImportRepository {
    async fn select_keys(&self, _table: &str, _key_field: &str) -> RepositoryResult<HashSet<String>> {
        if self.fail_select_keys {
            return Err(RepositoryError::DatabaseQueryError(
                "connection reset".to_string(),
            ));
        }
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn insert_many(&self, _table: &str, records: &[ImportRecord]) -> RepositoryResult<usize> {
        let keys: Vec<String> = records.iter().map(|r| r.key().to_string()).collect();
        self.insert_calls.lock().unwrap().push(keys.clone());

        if let Some(flag) = &self.cancel_on_first_insert {
            flag.cancel();
        }

        if keys.iter().any(|k| self.fail_keys.contains(k)) {
            return Err(RepositoryError::DatabaseQueryError(
                "disk I/O error".to_string(),
            ));
        }

        let mut existing = self.existing.lock().unwrap();
        if let Some(key) = keys.iter().find(|k| existing.contains(*k)) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "UNIQUE constraint failed: code = {}",
                key
            )));
        }
        existing.extend(keys);
        Ok(records.len())
    }

    async fn record_import_batch(&self, batch: &ImportBatchRecord) -> RepositoryResult<()> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

// ==========================================
// BlindRepository - 键读取总是失败的 SQLite 仓储
// ==========================================
// 用于验证冲突预检被跳过时，由数据库唯一约束兜底
pub struct BlindRepository(pub SqliteImportRepository);

#[async_trait]
impl ImportRepository for BlindRepository {
    async fn select_keys(&self, _table: &str, _key_field: &str) -> RepositoryResult<HashSet<String>> {
        Err(RepositoryError::DatabaseQueryError(
            "database is locked".to_string(),
        ))
    }

    async fn insert_many(&self, table: &str, records: &[ImportRecord]) -> RepositoryResult<usize> {
        self.0.insert_many(table, records).await
    }

    async fn record_import_batch(&self, batch: &ImportBatchRecord) -> RepositoryResult<()> {
        self.0.record_import_batch(batch).await
    }
}
