// ==========================================
// 教务管理系统 - 基础数据导入核心库
// ==========================================
// 技术栈: Rust + SQLite (rusqlite) + calamine / csv
// 系统定位: 表格 → 学业层次 / 课程 / 成绩等级 的校验与分批落库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据模型与强类型记录
pub mod domain;

// 规则层 - 各导入目标的字段规则与表头映射
pub mod schema;

// 导入层 - 解析 / 校验 / 去重 / 冲突检查 / 分批写入
pub mod importer;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CandidateRecord, CellValue, ImportPreview, ImportRecord, ImportResult, ImportStage,
    ImportTarget, ValidationError,
};

// 导入
pub use importer::{
    CancellationFlag, ImportError, ImportOrchestrator, ImportOutcome, Importer, SheetFormat,
};

// 仓储
pub use repository::{ImportRepository, RepositoryError, SqliteImportRepository};

// 配置
pub use config::{ConfigManager, ImportConfig, ImportConfigReader};

// 规则
pub use schema::TargetSchema;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "教务基础数据导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
