mod interface;
mod printer;
mod resolver;
mod schema;

pub use schema::{ArgumentParser, IntoFlags, Subparser};

pub(crate) use interface::{ConsoleInterface, UserInterface};
