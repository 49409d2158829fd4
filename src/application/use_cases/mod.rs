mod build_index;
mod push_collection;
mod search_courses;

pub use build_index::*;
pub use push_collection::*;
pub use search_courses::*;
