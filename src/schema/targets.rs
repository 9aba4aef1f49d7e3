// ==========================================
// 教务管理系统 - 导入目标规则表
// ==========================================
// 职责: 学业层次 / 课程 / 成绩等级 的字段、表头别名、行级规则
// 约束: 规则表为不可变数据，按次注入校验器
// ==========================================

use crate::domain::records::{AcademicLevel, Grade, ImportRecord, Subject};
use crate::domain::types::ImportTarget;
use crate::schema::rules::{FieldRule, FieldSpec, RowRule, ValidatedFields};

/// 学制周期允许值
pub const EDUCATION_CYCLES: &[&str] = &[
    "license",
    "master",
    "doctorate",
    "engineering",
    "preparatory",
];

// ==========================================
// TargetSchema - 单个导入目标的完整规则
// ==========================================
#[derive(Debug, Clone)]
pub struct TargetSchema {
    pub target: ImportTarget,
    pub table: &'static str,
    pub key_field: &'static str,
    pub fields: Vec<FieldSpec>,
    pub header_aliases: Vec<(&'static str, &'static str)>,
    pub row_rules: Vec<RowRule>,
    build: fn(&ValidatedFields) -> ImportRecord,
}

impl TargetSchema {
    pub fn for_target(target: ImportTarget) -> Self {
        match target {
            ImportTarget::AcademicLevel => Self::academic_levels(),
            ImportTarget::Subject => Self::subjects(),
            ImportTarget::Grade => Self::grades(),
        }
    }

    pub fn academic_levels() -> Self {
        Self {
            target: ImportTarget::AcademicLevel,
            table: "academic_levels",
            key_field: "code",
            // 层次代码常为单字母（L / M / D）
            fields: vec![
                FieldSpec::required("name", FieldRule::Text { min_len: 1 }),
                FieldSpec::required("code", FieldRule::Code { min_len: 1 }),
                FieldSpec::required("education_cycle", FieldRule::OneOf(EDUCATION_CYCLES)),
                FieldSpec::required("duration_years", FieldRule::PositiveInt),
                FieldSpec::required("semesters", FieldRule::PositiveInt),
                FieldSpec::required("order_index", FieldRule::PositiveInt),
                FieldSpec::optional("description", FieldRule::Text { min_len: 0 }),
            ],
            header_aliases: vec![
                ("Nom du niveau", "name"),
                ("Nom", "name"),
                ("Libellé", "name"),
                ("Code du niveau", "code"),
                ("Code", "code"),
                ("Cycle d'études", "education_cycle"),
                ("Cycle", "education_cycle"),
                ("Durée (années)", "duration_years"),
                ("Durée", "duration_years"),
                ("Nombre de semestres", "semesters"),
                ("Semestres", "semesters"),
                ("Ordre d'affichage", "order_index"),
                ("Ordre", "order_index"),
                ("Description", "description"),
            ],
            row_rules: Vec::new(),
            build: build_academic_level,
        }
    }

    pub fn subjects() -> Self {
        Self {
            target: ImportTarget::Subject,
            table: "subjects",
            key_field: "code",
            fields: vec![
                FieldSpec::required("name", FieldRule::Text { min_len: 2 }),
                FieldSpec::required("code", FieldRule::Code { min_len: 2 }),
                FieldSpec::required(
                    "coefficient",
                    FieldRule::DecimalRange { min: 0.5, max: 5.0 },
                ),
                FieldSpec::required("credits_ects", FieldRule::IntRange { min: 1, max: 30 }),
                FieldSpec::optional("hours_total", FieldRule::PositiveInt),
                FieldSpec::optional("semester", FieldRule::PositiveInt),
                FieldSpec::optional("level_code", FieldRule::Code { min_len: 1 }),
            ],
            header_aliases: vec![
                ("Nom de la matière", "name"),
                ("Matière", "name"),
                ("Nom", "name"),
                ("Code matière", "code"),
                ("Code", "code"),
                ("Coefficient", "coefficient"),
                ("Crédits ECTS", "credits_ects"),
                ("Crédits", "credits_ects"),
                ("Volume horaire", "hours_total"),
                ("Semestre", "semester"),
                ("Code du niveau", "level_code"),
                ("Niveau", "level_code"),
            ],
            row_rules: Vec::new(),
            build: build_subject,
        }
    }

    pub fn grades() -> Self {
        Self {
            target: ImportTarget::Grade,
            table: "grades",
            key_field: "code",
            fields: vec![
                FieldSpec::required("name", FieldRule::Text { min_len: 2 }),
                FieldSpec::required("code", FieldRule::Code { min_len: 1 }),
                FieldSpec::required("min_score", FieldRule::DecimalRange { min: 0.0, max: 20.0 }),
                FieldSpec::required("max_score", FieldRule::DecimalRange { min: 0.0, max: 20.0 }),
                FieldSpec::optional(
                    "grade_points",
                    FieldRule::DecimalRange { min: 0.0, max: 4.0 },
                ),
            ],
            header_aliases: vec![
                ("Mention", "name"),
                ("Libellé", "name"),
                ("Code", "code"),
                ("Note minimale", "min_score"),
                ("Note min", "min_score"),
                ("Note maximale", "max_score"),
                ("Note max", "max_score"),
                ("Points GPA", "grade_points"),
                ("Points", "grade_points"),
            ],
            row_rules: vec![RowRule::LessThan {
                lower: "min_score",
                upper: "max_score",
            }],
            build: build_grade,
        }
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// 表头别名 → 标准字段名（先精确匹配，再忽略大小写）
    pub fn canonical_field(&self, header: &str) -> Option<&'static str> {
        let header = header.trim();
        self.header_aliases
            .iter()
            .find(|(alias, _)| *alias == header)
            .or_else(|| {
                let lowered = header.to_lowercase();
                self.header_aliases
                    .iter()
                    .find(|(alias, _)| alias.to_lowercase() == lowered)
            })
            .map(|(_, field)| *field)
    }

    /// 空白导入模板的表头行（每个字段取第一个本地化别名）
    pub fn template_headers(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|spec| {
                self.header_aliases
                    .iter()
                    .find(|(_, field)| *field == spec.name)
                    .map(|(alias, _)| *alias)
                    .unwrap_or(spec.name)
            })
            .collect()
    }

    /// 由校验通过的字段值构造强类型记录
    pub fn build_record(&self, fields: &ValidatedFields) -> ImportRecord {
        (self.build)(fields)
    }
}

fn build_academic_level(f: &ValidatedFields) -> ImportRecord {
    ImportRecord::AcademicLevel(AcademicLevel {
        name: f.text("name").unwrap_or_default(),
        code: f.text("code").unwrap_or_default(),
        education_cycle: f.text("education_cycle").unwrap_or_default(),
        duration_years: f.int("duration_years").unwrap_or_default(),
        semesters: f.int("semesters").unwrap_or_default(),
        order_index: f.int("order_index").unwrap_or_default(),
        description: f.text("description").filter(|s| !s.is_empty()),
    })
}

fn build_subject(f: &ValidatedFields) -> ImportRecord {
    ImportRecord::Subject(Subject {
        name: f.text("name").unwrap_or_default(),
        code: f.text("code").unwrap_or_default(),
        coefficient: f.decimal("coefficient").unwrap_or_default(),
        credits_ects: f.int("credits_ects").unwrap_or_default(),
        hours_total: f.int("hours_total"),
        semester: f.int("semester"),
        level_code: f.text("level_code"),
    })
}

fn build_grade(f: &ValidatedFields) -> ImportRecord {
    ImportRecord::Grade(Grade {
        name: f.text("name").unwrap_or_default(),
        code: f.text("code").unwrap_or_default(),
        min_score: f.decimal("min_score").unwrap_or_default(),
        max_score: f.decimal("max_score").unwrap_or_default(),
        grade_points: f.decimal("grade_points"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_field_exact_and_case_insensitive() {
        let schema = TargetSchema::academic_levels();

        assert_eq!(schema.canonical_field("Nom du niveau"), Some("name"));
        assert_eq!(schema.canonical_field("  nom du niveau "), Some("name"));
        assert_eq!(schema.canonical_field("code"), Some("code"));
        assert_eq!(schema.canonical_field("order_index"), None);
    }

    #[test]
    fn test_required_fields_academic_levels() {
        let schema = TargetSchema::academic_levels();
        let required: Vec<_> = schema.required_fields().collect();

        assert_eq!(
            required,
            vec![
                "name",
                "code",
                "education_cycle",
                "duration_years",
                "semesters",
                "order_index"
            ]
        );
    }

    #[test]
    fn test_template_headers_localized() {
        let schema = TargetSchema::subjects();
        let headers = schema.template_headers();

        assert_eq!(headers[0], "Nom de la matière");
        assert_eq!(headers[3], "Crédits ECTS");
        assert_eq!(headers.len(), schema.fields.len());
    }

    #[test]
    fn test_for_target_tables() {
        assert_eq!(TargetSchema::for_target(ImportTarget::Subject).table, "subjects");
        assert_eq!(TargetSchema::for_target(ImportTarget::Grade).table, "grades");
        assert_eq!(
            TargetSchema::for_target(ImportTarget::AcademicLevel).key_field,
            "code"
        );
    }
}
