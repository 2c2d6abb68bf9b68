#![forbid(unsafe_code)]

pub mod build;
pub mod cli;
pub mod crawl;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod normalize;
pub mod paginate;
pub mod sql;
