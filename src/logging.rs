// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 导入管道按阶段输出 info / debug / warn 事件
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤级别（RUST_LOG 未设置时）
pub const DEFAULT_FILTER: &str = "info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 初始化日志系统（文本格式）
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=academic_import::importer=debug
///
/// # 示例
/// ```no_run
/// use academic_import::logging;
/// logging::init();
/// ```
///
/// 重复调用时保留已安装的 subscriber
pub fn init() {
    let _ = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// 初始化日志系统（JSON 格式，每个事件一行）
///
/// 导入结果中的 import_id 以结构化字段输出，便于按批次检索
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_current_span(true)
        .with_target(true)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}
