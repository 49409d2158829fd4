use std::collections::HashMap;

pub const FIELD_COURSE_NAME: &str = "课程名称";
pub const FIELD_INSTRUCTOR: &str = "授课老师";
pub const FIELD_REVIEW: &str = "课程内容与评价";
pub const FIELD_ATTENDANCE: &str = "考勤与平时作业";
pub const FIELD_FINAL_ASSESSMENT: &str = "期末考核方式";
pub const FIELD_REVIEWER_GRADE: &str = "课程成绩";
pub const FIELD_COURSE_TYPE: &str = "课程属性";

/// One untyped row of course-review data, keyed by column header.
///
/// Every key is optional. Readers of a record go through [`CourseRecord::field_or_empty`],
/// so an absent column and an empty cell look the same downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseRecord {
    fields: HashMap<String, String>,
}

impl CourseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn field_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CourseRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_reads_as_empty() {
        let record = CourseRecord::new().with_field(FIELD_COURSE_NAME, "计算机网络");

        assert_eq!(record.field_or_empty(FIELD_COURSE_NAME), "计算机网络");
        assert_eq!(record.field_or_empty(FIELD_INSTRUCTOR), "");
        assert!(record.get(FIELD_INSTRUCTOR).is_none());
    }

    #[test]
    fn collects_from_pairs() {
        let record: CourseRecord = [(FIELD_COURSE_NAME, "体育(一)"), (FIELD_COURSE_TYPE, "体育课")]
            .into_iter()
            .collect();

        assert_eq!(record.len(), 2);
        assert_eq!(record.get(FIELD_COURSE_TYPE), Some("体育课"));
    }
}
