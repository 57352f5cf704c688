//! dashopt - table-driven command-line option parsing.
//!
//! Options are declared once as an [`OptionTable`] whose entries point at
//! caller-owned slots. [`parse_args`] walks the tokens in a single pass,
//! binds every recognized option into its slot and hands back the program
//! name followed by the positional arguments.
//!
//! Besides the usual `-x`, `-xyz`, `-xVALUE`, `--name`, `--name VALUE` and
//! `--name=VALUE` forms, short options may be declared negatable, in which
//! case `+x` unsets them.

pub mod config;
pub mod help;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod table;

pub use config::{ArgKind, ConfigError, OptionConfig, SlotCell, SlotStorage, TableConfig};
pub use help::{generate_usage, write_usage, Palette};
pub use output::{generate_summary, report, write_report, write_summary};
pub use parser::{parse_args, parse_in_place, ParseError, ParseResult};
pub use table::{ArgPolicy, BoundValue, OptionDescriptor, OptionTable, Slot, TableError, ValuePolicy};
