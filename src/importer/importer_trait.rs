// ==========================================
// 教务管理系统 - 导入管道 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 流程: 读取 → 表头标准化 → 行校验 → 去重 → 冲突检查 → 分批写入
// ==========================================

use crate::domain::import::{
    CandidateRecord, ImportPreview, ImportResult, NormalizedRow, RawRow, StageOutcome,
    ValidationError,
};
use crate::importer::batch_writer::CancellationFlag;
use crate::importer::error::ImportOutcome;
use crate::importer::sheet_reader::SheetFormat;
use crate::schema::TextCase;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// Importer Trait
// ==========================================
// 用途: 导入主接口
// 实现者: ImportOrchestrator
#[async_trait]
pub trait Importer: Send + Sync {
    /// 仅校验（含去重与只读冲突检查），不落库
    ///
    /// # 返回
    /// - Ok(ImportPreview): 候选记录 + 行级错误
    /// - Err: 文件不可读（唯一的致命错误）
    async fn preview(&self, bytes: &[u8], format: SheetFormat) -> ImportOutcome<ImportPreview>;

    /// 提交已确认的预览结果（重新检查冲突后分批写入）
    async fn commit(&self, preview: ImportPreview) -> ImportResult {
        self.commit_cancellable(preview, &CancellationFlag::new()).await
    }

    /// 同 commit，取消信号由调用方按次传入
    async fn commit_cancellable(
        &self,
        preview: ImportPreview,
        cancel: &CancellationFlag,
    ) -> ImportResult;

    /// 完整导入流程
    ///
    /// # 流程（线性，无回退）
    /// Parsing → Normalizing → Validating → Deduplicating → ConflictChecking → Writing → Done
    ///
    /// # 说明
    /// - 文件不可读时直接进入 Done，success=false，仅含一条 general 错误
    /// - 其余阶段错误按行收集，不影响同文件其他行
    async fn run(&self, bytes: &[u8], format: SheetFormat) -> ImportResult {
        self.run_cancellable(bytes, format, &CancellationFlag::new()).await
    }

    /// 同 run，取消信号只作用于本次导入
    async fn run_cancellable(
        &self,
        bytes: &[u8],
        format: SheetFormat,
        cancel: &CancellationFlag,
    ) -> ImportResult;
}

// ==========================================
// SheetReader Trait
// ==========================================
// 用途: 表格解析接口（阶段 0）
// 实现者: CsvSheetReader, ExcelSheetReader
pub trait SheetReader: Send + Sync {
    /// 解析字节流为原始行（第一行为表头，空白行跳过）
    fn parse_to_raw_rows(&self, bytes: &[u8]) -> ImportOutcome<Vec<RawRow>>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 行校验接口（阶段 2）
// 实现者: SchemaRowValidator
pub trait RowValidator: Send + Sync {
    /// 校验单行
    ///
    /// # 返回
    /// - Ok(CandidateRecord): 全部规则通过
    /// - Err(Vec<ValidationError>): 该行所有违规（不短路）
    fn validate(&self, row: &NormalizedRow) -> Result<CandidateRecord, Vec<ValidationError>>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 显式标准化步骤（TRIM / UPPER / LOWER / NULL）
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段
    fn clean_text(&self, value: &str, case: TextCase) -> String;

    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<String>) -> Option<String>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: 键冲突处理（阶段 3-4）
// 实现者: ConflictHandlerImpl
pub trait ConflictHandler: Send + Sync {
    /// 检测同批次内重复键（行号小者优先保留）
    fn dedupe(&self, candidates: Vec<CandidateRecord>, key_field: &str) -> StageOutcome;

    /// 检测与已落库数据的键冲突
    fn check_conflicts(
        &self,
        candidates: Vec<CandidateRecord>,
        existing_keys: &HashSet<String>,
        key_field: &str,
    ) -> StageOutcome;
}
