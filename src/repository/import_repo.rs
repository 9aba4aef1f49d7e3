// ==========================================
// 教务管理系统 - 导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::ImportBatchRecord;
use crate::domain::records::ImportRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// ImportRepository Trait
// ==========================================
// 用途: 导入管道的外部存储协作者
// 实现者: SqliteImportRepository（使用 rusqlite）
#[async_trait]
pub trait ImportRepository: Send + Sync {
    /// 读取目标表全部已存在的键
    ///
    /// # 参数
    /// - table: 目标表名
    /// - key_field: 键字段名
    async fn select_keys(&self, table: &str, key_field: &str) -> RepositoryResult<HashSet<String>>;

    /// 批量插入（单次调用全部成功或全部失败）
    ///
    /// # 返回
    /// - Ok(usize): 插入的记录数
    /// - Err: 数据库错误（本次调用整体回滚）
    async fn insert_many(&self, table: &str, records: &[ImportRecord]) -> RepositoryResult<usize>;

    /// 记录导入批次审计信息（默认不记录）
    async fn record_import_batch(&self, _batch: &ImportBatchRecord) -> RepositoryResult<()> {
        Ok(())
    }
}
