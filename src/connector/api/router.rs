use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{BuildController, PushController, RemoteSearchController, SearchController};

pub struct Router<'a> {
    build_controller: BuildController<'a>,
    search_controller: SearchController<'a>,
    push_controller: PushController<'a>,
    remote_search_controller: RemoteSearchController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            build_controller: BuildController::new(container),
            search_controller: SearchController::new(container),
            push_controller: PushController::new(container),
            remote_search_controller: RemoteSearchController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Build { csv } => self.build_controller.build(&csv).await,
            Commands::Search {
                query,
                num,
                category,
            } => self.search_controller.search(query, num, category).await,
            Commands::Push { batch_size } => self.push_controller.push(batch_size).await,
            Commands::RemoteSearch {
                offset,
                query,
                num,
                category,
            } => {
                self.remote_search_controller
                    .search(offset, query, num, category)
                    .await
            }
        }
    }
}
