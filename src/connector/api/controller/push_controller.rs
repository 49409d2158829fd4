use anyhow::Result;
use tracing::info;

use crate::RemoteCollection;

use super::super::Container;

pub struct PushController<'a> {
    container: &'a Container,
}

impl<'a> PushController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn push(&self, batch_size: usize) -> Result<String> {
        let store = self.container.load_store().await?;
        let remote = self.container.remote_collection()?;
        info!(
            "Pushing {} from {}",
            remote.name(),
            self.container.db_dir().display()
        );

        let use_case = self.container.push_use_case(batch_size)?;
        let pushed = use_case.execute(&store).await?;

        Ok(format!(
            "Pushed {} points to collection {}",
            pushed,
            remote.name()
        ))
    }
}
