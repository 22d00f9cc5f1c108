pub(crate) const HELP_FLAGS: [&str; 2] = ["-h", "--help"];
pub(crate) const HELP_NAME: &str = "help";

/// Column budget for a single usage line.
pub(crate) const USAGE_LIMIT: usize = 80;
/// Column at which help descriptions start.
pub(crate) const HELP_COLUMN: usize = 24;

pub(crate) const USAGE_HEADER: &str = "usage: ";
