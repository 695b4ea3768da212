//! CLI domain: parse, route and output only.
//! Route handlers call into the tree modules and format their results.

mod output;
mod parse;
mod route;

pub use output::{format_listing, format_status_text, map_error};
pub use parse::{Cli, Commands, ModeArg, StatusFormat};
pub use route::RunContext;
