//! Command handlers, one module per subcommand

pub mod config;
pub mod setup;
pub mod smoke;

pub use config::{execute_config, render_config};
pub use setup::execute_setup;
pub use smoke::execute_smoke;
