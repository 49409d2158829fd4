use crate::domain::{
    CourseCategory, CourseRecord, NormalizedEntry, FIELD_ATTENDANCE, FIELD_COURSE_NAME,
    FIELD_COURSE_TYPE, FIELD_FINAL_ASSESSMENT, FIELD_INSTRUCTOR, FIELD_REVIEW,
    FIELD_REVIEWER_GRADE,
};

/// Label and source column for each line of the canonical text, in order.
pub const TEMPLATE_FIELDS: [(&str, &str); 6] = [
    ("课程名称", FIELD_COURSE_NAME),
    ("授课教师", FIELD_INSTRUCTOR),
    ("课程内容与评价", FIELD_REVIEW),
    ("考勤与平时作业", FIELD_ATTENDANCE),
    ("期末考核方式", FIELD_FINAL_ASSESSMENT),
    ("评价填写人成绩", FIELD_REVIEWER_GRADE),
];

/// Turns one raw record into its canonical text and category code.
///
/// Total over any input: absent fields become empty strings and an absent or
/// unknown course type becomes [`CourseCategory::Unspecified`].
pub fn normalize(record: &CourseRecord) -> NormalizedEntry {
    let text = TEMPLATE_FIELDS
        .iter()
        .map(|(label, field)| format!("{}：{}。", label, record.field_or_empty(field)))
        .collect::<Vec<_>>()
        .join("\n");

    let category = record
        .get(FIELD_COURSE_TYPE)
        .map(CourseCategory::from_label)
        .unwrap_or_default();

    NormalizedEntry::new(text, category)
}
