// ==========================================
// 教务管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 值一律参数化绑定；表名/字段名走白名单
// ==========================================

pub mod error;
pub mod import_repo;
pub mod import_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use import_repo::ImportRepository;
pub use import_repo_impl::SqliteImportRepository;
