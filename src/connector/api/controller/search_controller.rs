use anyhow::Result;

use crate::{CourseCategory, SearchQuery, SearchResult};

use super::super::Container;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Exact search over the locally built store.
    pub async fn search(&self, query: String, num: usize, category: u8) -> Result<String> {
        let search_query = build_query(num, category)?;

        let store = self.container.load_store().await?;
        let embedding_service = self.container.embedding_service().await?;

        let use_case = self.container.local_search_use_case(store);
        let results = use_case
            .search_by_text(embedding_service.as_ref(), &query, &search_query)
            .await?;

        Ok(format_results(&results))
    }
}

pub(crate) fn build_query(num: usize, category: u8) -> Result<SearchQuery> {
    let category = CourseCategory::try_from(category).map_err(anyhow::Error::msg)?;
    Ok(SearchQuery::new().with_limit(num).with_category(category))
}

/// Renders ranked results, one block per hit. Lower distance is closer.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut output = format!("Found {} results:\n\n", results.len());

    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, result.display_line()));
        output.push_str(&format!("   Category: {}\n", result.entry().category()));
        output.push_str(&format!("   {}\n\n", result.preview()));
    }

    output
}
