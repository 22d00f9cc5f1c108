//! `argot` is a declarative, argparse-style command line parser.
//!
//! Declare a schema of positional and optional arguments, hand the parser a
//! token sequence, and read the result out of a typed [`Namespace`]. The
//! design follows the classic argparse model: actions
//! (`store`/`append`/`count`/…), arities (`?`, `*`, `+`, or an exact
//! count), choices, defaults, required arguments, abbreviation resolution,
//! bundled short flags, `key=value` splits, file-expansion tokens, and
//! sub-commands inherited through parent schemas.
//!
//! The namespace hands back raw strings plus each argument's action tag;
//! converting to numeric or container types is left to the caller.
//!
//! # Usage
//! ```
//! use argot::{Action, ArgumentParser};
//!
//! # fn main() -> Result<(), argot::Error> {
//! let mut parser = ArgumentParser::new("frobnicate");
//! parser
//!     .add_argument("--verbose")?
//!     .action(Action::StoreTrue)?
//!     .help("Explain what is being done.");
//! parser.add_argument(["-o", "--output"])?.default_value("out.bin");
//! parser.add_argument("input")?;
//!
//! let namespace = parser.parse_args_from(["--verbose", "data.txt"])?;
//! assert_eq!(namespace.values("verbose")?, ["1"]);
//! assert_eq!(namespace.values("output")?, ["out.bin"]);
//! assert_eq!(namespace.values("input")?, ["data.txt"]);
//! # Ok(())
//! # }
//! ```
//!
//! Sub-commands branch the schema into child parsers:
//! ```
//! use argot::ArgumentParser;
//!
//! # fn main() -> Result<(), argot::Error> {
//! let mut parser = ArgumentParser::new("vcs");
//! let commands = parser.add_subparsers()?;
//! commands.dest("command");
//! commands.add_parser("commit").add_argument("--message")?;
//!
//! let namespace = parser.parse_args_from(["commit", "--message", "fix"])?;
//! assert_eq!(namespace.values("command")?, ["commit"]);
//! assert_eq!(namespace.values("message")?, ["fix"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Error policy
//! With `exit_on_error` left enabled (the default), a parse problem prints
//! the usage line and `<prog>: error: <message>` to stderr and terminates
//! the process; `--help` and `version` actions print and terminate with
//! exit code 0. Configure `exit_on_error(false)` to receive the typed
//! [`Error`] instead.
//!
//! # Features
//! * `debug`: trace resolver decisions via the `tracing` crate.
#![deny(missing_docs)]

mod argument;
mod constant;
mod error;
mod namespace;
mod parser;
mod tokens;

pub use argument::{Action, Argument, IntoNargs, Kind, Nargs};
pub use error::Error;
pub use namespace::Namespace;
pub use parser::{ArgumentParser, IntoFlags, Subparser};

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
