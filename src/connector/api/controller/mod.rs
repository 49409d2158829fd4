pub mod build_controller;
pub mod push_controller;
pub mod remote_search_controller;
pub mod search_controller;

pub use build_controller::BuildController;
pub use push_controller::PushController;
pub use remote_search_controller::RemoteSearchController;
pub use search_controller::{format_results, SearchController};
