use std::path::PathBuf;

use clap::Subcommand;

use crate::DEFAULT_PUSH_BATCH_SIZE;

#[derive(Subcommand)]
pub enum Commands {
    /// Build the local index from a course-review CSV
    Build {
        /// Input table (UTF-8, or GBK as a fallback)
        #[arg(long)]
        csv: PathBuf,
    },

    /// Search the local index
    Search {
        query: String,

        #[arg(short, long, default_value = "3")]
        num: usize,

        /// Course category code, 0 for all
        #[arg(short, long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=6))]
        category: u8,
    },

    /// Mirror the local index into the remote collection
    Push {
        #[arg(long, default_value_t = DEFAULT_PUSH_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Query the remote collection
    RemoteSearch {
        /// Use the local vector at this position as the query
        #[arg(long, default_value = "0", conflicts_with = "query")]
        offset: usize,

        /// Embed this text and use it as the query
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long, default_value = "3")]
        num: usize,

        #[arg(short, long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=6))]
        category: u8,
    },
}
