// ==========================================
// 教务管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportOutcome;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）, ImportConfig（固定值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 每次 insert_many 调用写入的记录数
    ///
    /// # 默认值
    /// - 10
    async fn get_batch_size(&self) -> ImportOutcome<usize>;

    /// 单次仓储调用（键读取 / 批量写入）的超时（毫秒）
    ///
    /// # 默认值
    /// - 30000
    async fn get_repository_timeout_ms(&self) -> ImportOutcome<u64>;

    /// 候选记录全部与已有数据冲突时，是否判定导入失败
    ///
    /// # 默认值
    /// - true
    async fn get_all_conflicts_fail(&self) -> ImportOutcome<bool>;
}
