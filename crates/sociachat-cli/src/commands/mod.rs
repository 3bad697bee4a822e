pub mod config;
pub mod load;
pub mod query;
pub mod status;

pub use load::run_load;
pub use query::run_query;
pub use status::show_status;
