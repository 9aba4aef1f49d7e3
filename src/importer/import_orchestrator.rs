// ==========================================
// 教务管理系统 - 导入编排器
// ==========================================
// 职责: 整合导入流程，从表格字节流到数据库
// 流程: 解析 → 表头标准化 → 行校验 → 去重 → 冲突检查 → 分批写入
// 约束:
// - 只有文件解析失败会终止整个导入
// - 其余阶段错误按行收集，最终按 row_number 稳定排序
// - 冲突预检只是优化，写入时以仓储唯一约束为准
// ==========================================

use crate::config::{ImportConfig, ImportConfigReader};
use crate::domain::import::{
    sort_errors, CandidateRecord, ImportBatchRecord, ImportPreview, ImportResult, StageOutcome,
    ValidationError,
};
use crate::domain::types::{ImportStage, ImportTarget};
use crate::importer::batch_writer::{BatchWriter, CancellationFlag};
use crate::importer::conflict_handler::{ConflictHandler as ConflictHandlerImpl, EXISTING_KEY_MESSAGE};
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::header_normalizer::HeaderNormalizer;
use crate::importer::importer_trait::{ConflictHandler, Importer, RowValidator};
use crate::importer::row_validator::SchemaRowValidator;
use crate::importer::sheet_reader::{SheetFormat, UniversalSheetReader};
use crate::repository::ImportRepository;
use crate::schema::TargetSchema;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

pub const CANCELLED_BEFORE_WRITE_MESSAGE: &str = "import cancelled before writing";

// ==========================================
// ImportOrchestrator - 单个导入目标的完整管道
// ==========================================
pub struct ImportOrchestrator<R, C>
where
    R: ImportRepository,
    C: ImportConfigReader,
{
    // 规则表（按目标注入）
    schema: TargetSchema,

    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    sheet_reader: UniversalSheetReader,
    header_normalizer: HeaderNormalizer,
    row_validator: Box<dyn RowValidator>,
    conflict_handler: Box<dyn ConflictHandler>,
}

/// 解析到去重为止的中间结果（尚未做冲突检查）
struct Deduplicated {
    valid: Vec<CandidateRecord>,
    errors: Vec<ValidationError>,
    total_rows: usize,
}

/// 写入阶段结论
struct WriteStage {
    result: ImportResult,
    // 写入前已取消：不记录导入批次
    cancelled_before_write: bool,
}

impl<R, C> ImportOrchestrator<R, C>
where
    R: ImportRepository,
    C: ImportConfigReader,
{
    /// 使用默认组件创建编排器
    pub fn new(target: ImportTarget, import_repo: R, config: C) -> Self {
        let schema = TargetSchema::for_target(target);
        let row_validator = Box::new(SchemaRowValidator::new(schema.clone()));

        Self::with_components(
            schema,
            import_repo,
            config,
            row_validator,
            Box::new(ConflictHandlerImpl),
        )
    }

    /// 注入自定义组件
    pub fn with_components(
        schema: TargetSchema,
        import_repo: R,
        config: C,
        row_validator: Box<dyn RowValidator>,
        conflict_handler: Box<dyn ConflictHandler>,
    ) -> Self {
        Self {
            schema,
            import_repo,
            config,
            sheet_reader: UniversalSheetReader,
            header_normalizer: HeaderNormalizer,
            row_validator,
            conflict_handler,
        }
    }

    pub fn target(&self) -> ImportTarget {
        self.schema.target
    }

    pub fn schema(&self) -> &TargetSchema {
        &self.schema
    }

    pub fn repository(&self) -> &R {
        &self.import_repo
    }

    /// 导入开始时解析一次配置快照，读取失败回退默认值
    async fn resolve_config(&self) -> ImportConfig {
        match ImportConfig::load(&self.config).await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "导入配置读取失败，使用默认配置");
                ImportConfig::default()
            }
        }
    }

    /// 解析 → 标准化 → 校验 → 去重
    fn validate_stages(&self, bytes: &[u8], format: SheetFormat) -> ImportOutcome<Deduplicated> {
        // === 阶段 0: 解析 ===
        debug!(stage = %ImportStage::Parsing, format = ?format, bytes = bytes.len(), "开始解析表格");
        let raw_rows = self.sheet_reader.parse(bytes, format)?;
        let total_rows = raw_rows.len();
        info!(total_rows, "表格解析完成");

        // === 阶段 1: 表头标准化 ===
        debug!(stage = %ImportStage::Normalizing, "表头标准化");
        let rows = self.header_normalizer.normalize(&self.schema, raw_rows);

        // === 阶段 2: 行校验 ===
        debug!(stage = %ImportStage::Validating, "行校验");
        let mut candidates = Vec::new();
        let mut errors = Vec::new();
        for row in &rows {
            match self.row_validator.validate(row) {
                Ok(candidate) => candidates.push(candidate),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }
        info!(
            valid = candidates.len(),
            errors = errors.len(),
            "行校验完成"
        );

        // === 阶段 3: 去重 ===
        debug!(stage = %ImportStage::Deduplicating, "批次内去重");
        let deduped = self.conflict_handler.dedupe(candidates, self.schema.key_field);
        if !deduped.errors.is_empty() {
            warn!(duplicates = deduped.errors.len(), "批次内存在重复键");
        }
        errors.extend(deduped.errors);

        Ok(Deduplicated {
            valid: deduped.valid,
            errors,
            total_rows,
        })
    }

    /// 读取已落库的键；失败或超时返回 None（跳过预检）
    async fn existing_keys(&self, timeout: Duration) -> Option<HashSet<String>> {
        let read = self
            .import_repo
            .select_keys(self.schema.table, self.schema.key_field);

        match tokio::time::timeout(timeout, read).await {
            Ok(Ok(keys)) => Some(keys),
            Ok(Err(e)) => {
                warn!(table = self.schema.table, error = %e, "已有键读取失败，跳过冲突预检");
                None
            }
            Err(_) => {
                warn!(
                    table = self.schema.table,
                    timeout_ms = timeout.as_millis() as u64,
                    "已有键读取超时，跳过冲突预检"
                );
                None
            }
        }
    }

    /// 阶段 4: 与已落库数据的冲突检查（只读）
    async fn conflict_stage(
        &self,
        candidates: Vec<CandidateRecord>,
        config: &ImportConfig,
    ) -> StageOutcome {
        debug!(stage = %ImportStage::ConflictChecking, candidates = candidates.len(), "冲突检查");

        match self.existing_keys(config.repository_timeout()).await {
            Some(keys) => {
                let outcome =
                    self.conflict_handler
                        .check_conflicts(candidates, &keys, self.schema.key_field);
                if !outcome.errors.is_empty() {
                    warn!(conflicts = outcome.errors.len(), "存在与已有数据冲突的键");
                }
                outcome
            }
            None => StageOutcome {
                valid: candidates,
                errors: Vec::new(),
            },
        }
    }

    /// 冲突复查 + 分批写入
    ///
    /// prior_conflicts: 调用前已判定为冲突的候选数（来自预览）
    #[allow(clippy::too_many_arguments)]
    async fn write_stage(
        &self,
        import_id: &str,
        candidates: Vec<CandidateRecord>,
        mut errors: Vec<ValidationError>,
        total_rows: usize,
        prior_conflicts: usize,
        config: &ImportConfig,
        cancel: &CancellationFlag,
    ) -> WriteStage {
        let deduped_count = candidates.len() + prior_conflicts;

        let checked = self.conflict_stage(candidates, config).await;
        let conflicts = prior_conflicts + checked.errors.len();
        errors.extend(checked.errors);

        if config.all_conflicts_fail && deduped_count > 0 && conflicts == deduped_count {
            warn!(import_id, conflicts, "全部候选记录与已有数据冲突，导入判定失败");
            return WriteStage {
                result: self.finish(import_id, false, total_rows, 0, errors),
                cancelled_before_write: false,
            };
        }

        if cancel.is_cancelled() {
            info!(import_id, "写入前已取消，未修改任何数据");
            errors.push(ValidationError::general(0, CANCELLED_BEFORE_WRITE_MESSAGE));
            return WriteStage {
                result: self.finish(import_id, false, total_rows, 0, errors),
                cancelled_before_write: true,
            };
        }

        // === 阶段 5: 分批写入 ===
        let to_write = checked.valid;
        debug!(
            stage = %ImportStage::Writing,
            records = to_write.len(),
            batch_size = config.batch_size,
            "分批写入"
        );
        let writer = BatchWriter::new(&self.import_repo, config.repository_timeout());
        let outcome = writer
            .write(self.schema.table, &to_write, config.batch_size, cancel)
            .await;
        errors.extend(outcome.errors);

        let success = to_write.is_empty() || outcome.imported > 0;
        WriteStage {
            result: self.finish(import_id, success, total_rows, outcome.imported, errors),
            cancelled_before_write: false,
        }
    }

    fn finish(
        &self,
        import_id: &str,
        success: bool,
        total_rows: usize,
        imported: usize,
        mut errors: Vec<ValidationError>,
    ) -> ImportResult {
        sort_errors(&mut errors);

        let result = ImportResult {
            import_id: import_id.to_string(),
            target: self.schema.target,
            success,
            total_rows,
            imported,
            skipped: total_rows.saturating_sub(imported),
            errors,
        };

        info!(
            stage = %ImportStage::Done,
            import_id,
            import_target = %result.target,
            success = result.success,
            total = result.total_rows,
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            "导入结束"
        );
        result
    }

    fn parse_failure(&self, import_id: &str, err: ImportError) -> ImportResult {
        error!(import_id, error = %err, "文件解析失败，导入终止");
        self.finish(
            import_id,
            false,
            0,
            0,
            vec![ValidationError::general(0, err.to_string())],
        )
    }

    /// 记录导入批次（失败只记录日志，不影响结果）
    async fn record_batch(&self, result: &ImportResult, started: Instant) {
        let errors_json = match serde_json::to_string(&result.errors) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "错误列表序列化失败");
                "[]".to_string()
            }
        };

        let batch = ImportBatchRecord {
            import_id: result.import_id.clone(),
            target: result.target,
            total_rows: result.total_rows,
            imported: result.imported,
            skipped: result.skipped,
            error_count: result.errors.len(),
            success: result.success,
            elapsed_ms: started.elapsed().as_millis() as i64,
            imported_at: Utc::now(),
            errors_json,
        };

        if let Err(e) = self.import_repo.record_import_batch(&batch).await {
            warn!(import_id = %batch.import_id, error = %e, "导入批次记录失败");
        }
    }
}

#[async_trait]
impl<R, C> Importer for ImportOrchestrator<R, C>
where
    R: ImportRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, bytes))]
    async fn preview(&self, bytes: &[u8], format: SheetFormat) -> ImportOutcome<ImportPreview> {
        let config = self.resolve_config().await;

        let deduped = self.validate_stages(bytes, format).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        let checked = self.conflict_stage(deduped.valid, &config).await;
        let mut errors = deduped.errors;
        errors.extend(checked.errors);
        sort_errors(&mut errors);

        Ok(ImportPreview {
            target: self.schema.target,
            valid: checked.valid,
            errors,
            total_rows: deduped.total_rows,
        })
    }

    #[instrument(skip(self, preview, cancel), fields(import_id))]
    async fn commit_cancellable(
        &self,
        preview: ImportPreview,
        cancel: &CancellationFlag,
    ) -> ImportResult {
        let started = Instant::now();
        let import_id = Uuid::new_v4().to_string();
        Span::current().record("import_id", import_id.as_str());

        if preview.target != self.schema.target {
            error!(preview_target = %preview.target, "预览结果与导入目标不一致");
            let message = format!(
                "preview for {} cannot be committed to {}",
                preview.target, self.schema.target
            );
            return self.finish(
                &import_id,
                false,
                preview.total_rows,
                0,
                vec![ValidationError::general(0, message)],
            );
        }

        let config = self.resolve_config().await;
        let prior_conflicts = preview
            .errors
            .iter()
            .filter(|e| e.field == self.schema.key_field && e.message == EXISTING_KEY_MESSAGE)
            .count();

        let stage = self
            .write_stage(
                &import_id,
                preview.valid,
                preview.errors,
                preview.total_rows,
                prior_conflicts,
                &config,
                cancel,
            )
            .await;

        if !stage.cancelled_before_write {
            self.record_batch(&stage.result, started).await;
        }
        stage.result
    }

    #[instrument(skip(self, bytes, cancel), fields(import_id))]
    async fn run_cancellable(
        &self,
        bytes: &[u8],
        format: SheetFormat,
        cancel: &CancellationFlag,
    ) -> ImportResult {
        let started = Instant::now();
        let import_id = Uuid::new_v4().to_string();
        Span::current().record("import_id", import_id.as_str());
        info!(import_target = %self.schema.target, bytes = bytes.len(), "开始导入");

        let config = self.resolve_config().await;

        let stage = match self.validate_stages(bytes, format) {
            Ok(deduped) => {
                self.write_stage(
                    &import_id,
                    deduped.valid,
                    deduped.errors,
                    deduped.total_rows,
                    0,
                    &config,
                    cancel,
                )
                .await
            }
            Err(e) => WriteStage {
                result: self.parse_failure(&import_id, e),
                cancelled_before_write: false,
            },
        };

        if !stage.cancelled_before_write {
            self.record_batch(&stage.result, started).await;
        }
        stage.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteImportRepository;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn orchestrator(target: ImportTarget) -> ImportOrchestrator<SqliteImportRepository, ImportConfig> {
        let conn = Connection::open_in_memory().unwrap();
        let repo = SqliteImportRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        ImportOrchestrator::new(target, repo, ImportConfig::default())
    }

    const LEVELS_CSV: &str = "Nom du niveau,Code,Cycle,Durée (années),Semestres,Ordre\n\
        Licence,L,license,3,6,1\n\
        M,L,master,2,4,2\n";

    #[tokio::test]
    async fn test_run_rejects_duplicate_code() {
        let importer = orchestrator(ImportTarget::AcademicLevel);

        let result = importer.run(LEVELS_CSV.as_bytes(), SheetFormat::Csv).await;

        assert!(result.success);
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row_number, 3);
        assert_eq!(result.errors[0].field, "code");
    }

    #[tokio::test]
    async fn test_parse_failure_short_circuits() {
        let importer = orchestrator(ImportTarget::Subject);

        let result = importer.run(b"\x00\x01garbage", SheetFormat::Xlsx).await;

        assert!(!result.success);
        assert_eq!(result.imported, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row_number, 0);
        assert_eq!(result.errors[0].field, "general");
    }

    #[tokio::test]
    async fn test_cancel_before_write_is_noop() {
        let importer = orchestrator(ImportTarget::AcademicLevel);
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let result = importer
            .run_cancellable(LEVELS_CSV.as_bytes(), SheetFormat::Csv, &cancel)
            .await;
        let keys = importer
            .repository()
            .select_keys("academic_levels", "code")
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.imported, 0);
        assert!(keys.is_empty());
        assert!(result
            .errors
            .iter()
            .any(|e| e.message == CANCELLED_BEFORE_WRITE_MESSAGE));
    }

    #[tokio::test]
    async fn test_cancellation_does_not_outlive_run() {
        let importer = orchestrator(ImportTarget::AcademicLevel);
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let cancelled = importer
            .run_cancellable(LEVELS_CSV.as_bytes(), SheetFormat::Csv, &cancel)
            .await;
        let next = importer.run(LEVELS_CSV.as_bytes(), SheetFormat::Csv).await;

        assert!(!cancelled.success);
        assert!(next.success);
        assert_eq!(next.imported, 1);
        assert!(next
            .errors
            .iter()
            .all(|e| e.message != CANCELLED_BEFORE_WRITE_MESSAGE));
    }

    #[tokio::test]
    async fn test_commit_rejects_foreign_preview() {
        let levels = orchestrator(ImportTarget::AcademicLevel);
        let grades = orchestrator(ImportTarget::Grade);

        let preview = levels.preview(LEVELS_CSV.as_bytes(), SheetFormat::Csv).await.unwrap();
        let result = grades.commit(preview).await;

        assert!(!result.success);
        assert_eq!(result.imported, 0);
        assert_eq!(result.errors.len(), 1);
    }
}
