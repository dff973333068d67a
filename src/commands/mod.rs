//! CLI command implementations

mod correct;
mod init;
mod load;
mod query;

pub use correct::{cmd_correct, print_correction};
pub use init::cmd_init;
pub use load::{cmd_load, print_load_stats, LoadStats};
pub use query::{cmd_classes, cmd_countries, cmd_search, print_response};
