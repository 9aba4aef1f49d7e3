// ==========================================
// 教务管理系统 - 分批写入器
// ==========================================
// 阶段 5: 候选记录按顺序切分为连续批次，逐批调用 insert_many
// 约束:
// - 批次严格串行，失败批次不影响后续批次
// - 失败批次内每条记录生成一条 general 错误
// - 取消只在批次边界生效，进行中的批次允许完成
// ==========================================

use crate::domain::import::{CandidateRecord, ValidationError};
use crate::domain::records::ImportRecord;
use crate::repository::ImportRepository;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const CANCELLED_MESSAGE: &str = "import cancelled before this batch was written";

// ==========================================
// CancellationFlag - 调用方取消信号（可克隆共享）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOutcome {
    pub imported: usize,
    pub errors: Vec<ValidationError>,
}

pub struct BatchWriter<'a> {
    repo: &'a dyn ImportRepository,
    timeout: Duration,
}

impl<'a> BatchWriter<'a> {
    pub fn new(repo: &'a dyn ImportRepository, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    /// 分批写入
    ///
    /// # 返回
    /// - imported: 成功批次内的记录数
    /// - errors: 失败 / 超时 / 取消批次内每条记录一条 general 错误
    pub async fn write(
        &self,
        table: &str,
        candidates: &[CandidateRecord],
        batch_size: usize,
        cancel: &CancellationFlag,
    ) -> WriteOutcome {
        let batch_size = batch_size.max(1);
        let mut outcome = WriteOutcome::default();

        for (batch_index, batch) in candidates.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                debug!(batch_index, records = batch.len(), "批次未执行（已取消）");
                fail_batch(&mut outcome, batch, CANCELLED_MESSAGE);
                continue;
            }

            let records: Vec<ImportRecord> = batch.iter().map(|c| c.record.clone()).collect();

            match timeout(self.timeout, self.repo.insert_many(table, &records)).await {
                Ok(Ok(_)) => {
                    debug!(batch_index, records = batch.len(), "批次写入成功");
                    outcome.imported += batch.len();
                }
                Ok(Err(e)) => {
                    warn!(batch_index, records = batch.len(), error = %e, "批次写入失败");
                    fail_batch(&mut outcome, batch, &format!("batch insert failed: {}", e));
                }
                Err(_) => {
                    warn!(
                        batch_index,
                        records = batch.len(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "批次写入超时"
                    );
                    fail_batch(
                        &mut outcome,
                        batch,
                        &format!(
                            "batch insert timed out after {} ms",
                            self.timeout.as_millis()
                        ),
                    );
                }
            }
        }

        info!(
            table,
            imported = outcome.imported,
            failed = outcome.errors.len(),
            "分批写入完成"
        );
        outcome
    }
}

fn fail_batch(outcome: &mut WriteOutcome, batch: &[CandidateRecord], message: &str) {
    outcome.errors.extend(
        batch
            .iter()
            .map(|c| ValidationError::general(c.row_number, message)),
    );
}
