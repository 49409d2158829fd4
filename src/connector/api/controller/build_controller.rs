use std::path::Path;

use anyhow::Result;

use crate::{CsvRecordReader, StoreFiles};

use super::super::Container;

pub struct BuildController<'a> {
    container: &'a Container,
}

impl<'a> BuildController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn build(&self, csv: &Path) -> Result<String> {
        let records = CsvRecordReader::read_path(csv)?;

        let use_case = self.container.build_use_case().await?;
        let files = use_case.execute(&records).await?;

        Ok(format_build_success(&files))
    }
}

fn format_build_success(files: &StoreFiles) -> String {
    format!(
        "Indexed {} course records\nIndex:    {}\nMetadata: {}",
        files.record_count,
        files.index_path.display(),
        files.metadata_path.display()
    )
}
