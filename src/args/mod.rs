//! Command-line surface for plugin arguments.
//!
//! ```text
//! Registry → bind (one flag per argument) → parse → ParsedArguments + value slots
//!          → construct → CommandLineCollector → ArgAssembler → tokens
//! ```

mod assembler;
mod binder;
mod parser;

pub use assembler::{ArgAssembler, CommandLineCollector};
pub use binder::{bind, flag_help, flag_long, ParsedArguments};
pub use parser::{ClapFlagParser, FlagCallback, FlagParser, FlagShape, FlagSpec, FlagValue};
