use anyhow::{Context, Result};

use super::search_controller::{build_query, format_results};
use super::super::Container;

pub struct RemoteSearchController<'a> {
    container: &'a Container,
}

impl<'a> RemoteSearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Queries the remote collection with either live text or a vector taken
    /// back out of the local index at `offset`.
    pub async fn search(
        &self,
        offset: usize,
        query: Option<String>,
        num: usize,
        category: u8,
    ) -> Result<String> {
        let search_query = build_query(num, category)?;
        let use_case = self.container.remote_search_use_case()?;

        let results = match query {
            Some(text) => {
                let embedding_service = self.container.embedding_service().await?;
                use_case
                    .search_by_text(embedding_service.as_ref(), &text, &search_query)
                    .await?
            }
            None => {
                let store = self.container.load_store().await?;
                let vector = store.vector(offset).with_context(|| {
                    format!(
                        "offset {} is outside the local index ({} records)",
                        offset,
                        store.len()
                    )
                })?;
                use_case.search_by_vector(&vector, &search_query).await?
            }
        };

        Ok(format_results(&results))
    }
}
