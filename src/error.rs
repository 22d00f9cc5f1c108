use thiserror::Error;

/// The error kinds raised by declaration and parsing.
///
/// Declaration problems (`Value`, `Type`, `Index`, and the `Argument`
/// conflicts detected when the result skeleton is built) propagate
/// unconditionally.
/// User-input problems (`Parse`) obey the parser's `exit_on_error` policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A declaration conflict surfaced at parse time, such as two arguments
    /// resolving to the same result key.
    #[error("argument error: {0}")]
    Argument(String),

    /// A malformed declaration value, such as an unknown action name or an
    /// invalid nargs pattern.
    #[error("value error: {0}")]
    Value(String),

    /// A field that is illegal for the argument's current action or kind.
    #[error("type error: {0}")]
    Type(String),

    /// An out-of-range operation, such as an empty flag string.
    #[error("index error: {0}")]
    Index(String),

    /// A [`Namespace`](crate::Namespace) lookup of an absent key.
    #[error("attribute error: {0}")]
    Attribute(String),

    /// A problem with the input tokens themselves.
    #[error("{0}")]
    Parse(String),
}
