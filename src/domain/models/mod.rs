mod course_category;
mod course_record;
mod embedding;
mod flat_index;
mod normalized_entry;
mod search_result;
mod vector_store;

pub use course_category::*;
pub use course_record::*;
pub use embedding::*;
pub use flat_index::*;
pub use normalized_entry::*;
pub use search_result::*;
pub use vector_store::*;
