// ==========================================
// 教务管理系统 - 键冲突处理器实现
// ==========================================
// 阶段 3: 同批次内重复键（先出现者保留）
// 阶段 4: 与已落库数据的键冲突
// ==========================================

use crate::domain::import::{CandidateRecord, StageOutcome, ValidationError};
use crate::importer::importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::{HashMap, HashSet};

/// 与已落库数据冲突时的错误信息
pub const EXISTING_KEY_MESSAGE: &str = "key already exists in the database";

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// 检测同批次内重复键
    ///
    /// # 规则
    /// - "先出现"严格按 row_number 升序判定
    /// - 首次出现保留，其后每次出现降级为错误，并指向首次出现的行号
    fn dedupe(&self, mut candidates: Vec<CandidateRecord>, key_field: &str) -> StageOutcome {
        candidates.sort_by_key(|c| c.row_number);

        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut outcome = StageOutcome::default();

        for candidate in candidates {
            if let Some(&first_row) = first_occurrence.get(candidate.key()) {
                outcome.errors.push(ValidationError::new(
                    candidate.row_number,
                    key_field,
                    format!(
                        "key '{}' already used at row {}",
                        candidate.key(),
                        first_row
                    ),
                ));
            } else {
                first_occurrence.insert(candidate.key().to_string(), candidate.row_number);
                outcome.valid.push(candidate);
            }
        }

        outcome
    }

    /// 检测与已落库数据的键冲突
    fn check_conflicts(
        &self,
        candidates: Vec<CandidateRecord>,
        existing_keys: &HashSet<String>,
        key_field: &str,
    ) -> StageOutcome {
        let mut outcome = StageOutcome::default();

        for candidate in candidates {
            if existing_keys.contains(candidate.key()) {
                outcome.errors.push(ValidationError::new(
                    candidate.row_number,
                    key_field,
                    EXISTING_KEY_MESSAGE,
                ));
            } else {
                outcome.valid.push(candidate);
            }
        }

        outcome
    }
}
