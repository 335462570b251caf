// One module per subcommand. main.rs parses and dispatches to these.

pub mod call;
pub mod check_env;
pub mod mcp;
pub mod query;
