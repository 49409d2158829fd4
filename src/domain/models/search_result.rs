use serde::{Deserialize, Serialize};

use super::{CourseCategory, NormalizedEntry};

pub const PREVIEW_CHARS: usize = 120;
pub const CONTINUATION_MARKER: &str = "...";

/// One ranked neighbor: its position in the store, its distance and its payload.
///
/// Scores are L2 distances, so lower means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    position: u64,
    score: f32,
    entry: NormalizedEntry,
}

impl SearchResult {
    pub fn new(position: u64, score: f32, entry: NormalizedEntry) -> Self {
        Self {
            position,
            score,
            entry,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn entry(&self) -> &NormalizedEntry {
        &self.entry
    }

    pub fn preview(&self) -> String {
        preview(self.entry.text(), PREVIEW_CHARS)
    }

    pub fn display_line(&self) -> String {
        format!("#{} (distance: {:.4})", self.position, self.score)
    }
}

/// Single-line preview of `text`: at most `limit` characters with each line
/// break (`\r\n`, `\n` or `\r`) turned into one space, plus
/// [`CONTINUATION_MARKER`] when anything was cut.
pub fn preview(text: &str, limit: usize) -> String {
    let flattened = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let mut snippet: String = flattened.chars().take(limit).collect();
    if flattened.chars().count() > limit {
        snippet.push_str(CONTINUATION_MARKER);
    }
    snippet
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    limit: usize,
    category: Option<CourseCategory>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self {
            limit: 3,
            category: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        // Ensure at least 1 result is requested
        self.limit = limit.max(1);
        self
    }

    /// Restricts results to one category. `Unspecified` clears the filter.
    pub fn with_category(mut self, category: CourseCategory) -> Self {
        self.category = if category.is_unspecified() {
            None
        } else {
            Some(category)
        };
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn category(&self) -> Option<CourseCategory> {
        self.category
    }

    pub fn matches(&self, entry: &NormalizedEntry) -> bool {
        self.category
            .map_or(true, |category| entry.category() == category)
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("limit={}", self.limit)];
        if let Some(category) = self.category {
            parts.push(format!("category={}", category));
        }
        parts.join(", ")
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_is_cut_with_marker() {
        let text = "课".repeat(200);

        let shown = preview(&text, PREVIEW_CHARS);

        assert_eq!(shown.chars().count(), PREVIEW_CHARS + CONTINUATION_MARKER.len());
        assert!(shown.ends_with(CONTINUATION_MARKER));
        assert_eq!(shown.trim_end_matches(CONTINUATION_MARKER), "课".repeat(120));
    }

    #[test]
    fn short_text_is_unchanged() {
        let text = "a".repeat(50);

        assert_eq!(preview(&text, PREVIEW_CHARS), text);
        assert_eq!(preview(&"b".repeat(120), PREVIEW_CHARS), "b".repeat(120));
    }

    #[test]
    fn newlines_become_spaces() {
        assert_eq!(preview("课程名称：A。\n授课教师：B。", 120), "课程名称：A。 授课教师：B。");
    }

    #[test]
    fn crlf_is_one_space() {
        assert_eq!(preview("课程名称：A。\r\n授课教师：B。", 120), "课程名称：A。 授课教师：B。");
        assert_eq!(preview("a\rb\r\n\nc", 120), "a b  c");
        assert_eq!(preview("ab\r\ncd", 3), "ab ...");
    }

    #[test]
    fn result_preview_uses_entry_text() {
        let entry = NormalizedEntry::new("x".repeat(130), CourseCategory::English);
        let result = SearchResult::new(7, 0.5, entry);

        assert_eq!(result.preview(), format!("{}...", "x".repeat(120)));
        assert_eq!(result.display_line(), "#7 (distance: 0.5000)");
    }

    #[test]
    fn unspecified_category_disables_filter() {
        let query = SearchQuery::new().with_category(CourseCategory::Unspecified);
        assert_eq!(query.category(), None);

        let query = SearchQuery::new().with_limit(0).with_category(CourseCategory::Major);
        assert_eq!(query.limit(), 1);
        assert!(query.matches(&NormalizedEntry::new("", CourseCategory::Major)));
        assert!(!query.matches(&NormalizedEntry::new("", CourseCategory::English)));
    }
}
