use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::tokens;

/// The storage discipline applied when an argument specification is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Store the supplied values, overwriting any earlier specification.
    Store,
    /// Store the declared const value.
    StoreConst,
    /// Store `"1"` (with a default of `"0"`).
    StoreTrue,
    /// Store `"0"` (with a default of `"1"`).
    StoreFalse,
    /// Append the supplied values across specifications.
    Append,
    /// Append the declared const value.
    AppendConst,
    /// Count the number of specifications.
    Count,
    /// Print the help message and stop.
    Help,
    /// Print the declared version and stop.
    Version,
    /// Append the supplied values across specifications.
    Extend,
}

impl Action {
    /// Whether matching this action consumes value tokens.
    pub(crate) fn takes_values(&self) -> bool {
        matches!(self, Action::Store | Action::Append | Action::Extend)
    }

    /// Whether usage/help decorates this action's flags with value names.
    pub(crate) fn displays_values(&self) -> bool {
        matches!(
            self,
            Action::Store | Action::Append | Action::Extend | Action::AppendConst
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Store => "store",
            Action::StoreConst => "store_const",
            Action::StoreTrue => "store_true",
            Action::StoreFalse => "store_false",
            Action::Append => "append",
            Action::AppendConst => "append_const",
            Action::Count => "count",
            Action::Help => "help",
            Action::Version => "version",
            Action::Extend => "extend",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "store" => Ok(Action::Store),
            "store_const" => Ok(Action::StoreConst),
            "store_true" => Ok(Action::StoreTrue),
            "store_false" => Ok(Action::StoreFalse),
            "append" => Ok(Action::Append),
            "append_const" => Ok(Action::AppendConst),
            "count" => Ok(Action::Count),
            "help" => Ok(Action::Help),
            "version" => Ok(Action::Version),
            "extend" => Ok(Action::Extend),
            _ => Err(Error::Value(format!("unknown action '{value}'"))),
        }
    }
}

/// The number of value tokens one argument specification consumes.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// Implicit: one value for `store`/`append`/`extend`, zero for the
    /// constant and counting actions.
    Default,
    /// N: precisely `N` values.
    Precisely(u32),
    /// `?`: zero or one value.
    ZeroOrOne,
    /// `*`: any number of values, including zero.
    Any,
    /// `+`: at least one value.
    AtLeastOne,
}

impl fmt::Display for Nargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nargs::Default => Ok(()),
            Nargs::Precisely(n) => write!(f, "{n}"),
            Nargs::ZeroOrOne => write!(f, "?"),
            Nargs::Any => write!(f, "*"),
            Nargs::AtLeastOne => write!(f, "+"),
        }
    }
}

/// Conversions accepted by [`Argument::nargs`]: a precise count, or one of
/// the `"?"`, `"*"`, `"+"` patterns.
pub trait IntoNargs {
    /// Convert into an arity, or fail with a value error.
    fn into_nargs(self) -> Result<Nargs, Error>;
}

impl IntoNargs for u32 {
    fn into_nargs(self) -> Result<Nargs, Error> {
        Ok(Nargs::Precisely(self))
    }
}

impl IntoNargs for &str {
    fn into_nargs(self) -> Result<Nargs, Error> {
        match self.trim() {
            "?" => Ok(Nargs::ZeroOrOne),
            "*" => Ok(Nargs::Any),
            "+" => Ok(Nargs::AtLeastOne),
            other => Err(Error::Value(format!("invalid nargs value '{other}'"))),
        }
    }
}

/// Whether an argument is matched positionally or by its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Matched by position among the non-option tokens.
    Positional,
    /// Matched by one of its prefixed flags.
    Optional,
}

/// One declared argument: its flags, action, arity, and the remaining
/// descriptor fields.
///
/// Built through [`ArgumentParser::add_argument`](crate::ArgumentParser::add_argument)
/// and treated as immutable once parsing begins.
pub struct Argument {
    pub(crate) flags: Vec<String>,
    pub(crate) name: String,
    pub(crate) kind: Kind,
    pub(crate) action: Action,
    pub(crate) nargs: Nargs,
    pub(crate) const_value: Option<String>,
    pub(crate) default_value: Option<String>,
    pub(crate) choices: Vec<String>,
    pub(crate) required: bool,
    pub(crate) help: Option<String>,
    pub(crate) help_suppressed: bool,
    pub(crate) metavar: Option<String>,
    pub(crate) dest: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) callback: Option<Box<dyn Fn() + Send + Sync>>,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("flags", &self.flags)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("action", &self.action)
            .field("nargs", &self.nargs)
            .finish()
    }
}

impl Argument {
    pub(crate) fn new(flags: Vec<String>, name: String, kind: Kind) -> Self {
        Self {
            flags,
            name,
            kind,
            action: Action::Store,
            nargs: Nargs::Default,
            const_value: None,
            default_value: None,
            choices: Vec::default(),
            required: false,
            help: None,
            help_suppressed: false,
            metavar: None,
            dest: None,
            version: None,
            callback: None,
        }
    }

    /// The declared flag strings.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// The canonical flag-name: the body of the flag with the most prefix
    /// characters.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional or optional.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Set the action, resetting dependent fields.
    ///
    /// `store_true`/`store_false` preset default, const and a zero arity;
    /// the constant and counting actions force a zero arity; switching away
    /// from `store_true` drops any callback, and switching away from
    /// `version` drops the help text it defaulted.
    pub fn action(&mut self, value: Action) -> Result<&mut Self, Error> {
        if self.action == Action::StoreTrue && value != Action::StoreTrue {
            self.callback = None;
        }
        if self.action == Action::Version && value != Action::Version {
            self.help = None;
        }
        match value {
            Action::StoreTrue => {
                self.default_value = Some("0".to_string());
                self.const_value = Some("1".to_string());
                self.nargs = Nargs::Precisely(0);
                self.choices.clear();
            }
            Action::StoreFalse => {
                self.default_value = Some("1".to_string());
                self.const_value = Some("0".to_string());
                self.nargs = Nargs::Precisely(0);
                self.choices.clear();
            }
            Action::Help | Action::Version => {
                if self.kind == Kind::Positional {
                    return Err(Error::Type(format!(
                        "action '{value}' is not valid for positionals"
                    )));
                }
                if value == Action::Version {
                    self.help = Some("show program's version number and exit".to_string());
                }
                self.nargs = Nargs::Precisely(0);
                self.choices.clear();
            }
            Action::StoreConst | Action::AppendConst | Action::Count => {
                self.nargs = Nargs::Precisely(0);
                self.choices.clear();
            }
            Action::Store | Action::Append | Action::Extend => {
                if self.nargs == Nargs::Precisely(0) {
                    self.nargs = Nargs::Default;
                }
            }
        }
        self.action = value;
        Ok(self)
    }

    /// Set the arity: a count, or one of the `"?"`, `"*"`, `"+"` patterns.
    pub fn nargs<N: IntoNargs>(&mut self, value: N) -> Result<&mut Self, Error> {
        if !self.action.takes_values() {
            return Err(Error::Type(
                "got an unexpected keyword argument 'nargs'".to_string(),
            ));
        }
        let nargs = value.into_nargs()?;
        if nargs == Nargs::Precisely(0) {
            return Err(match self.action {
                Action::Store => Error::Value(
                    "nargs for store actions must be != 0; if you have nothing to store, \
                     actions such as store true or store const may be more appropriate"
                        .to_string(),
                ),
                _ => Error::Value(
                    "nargs for append actions must be != 0; if arg strings are not supplying \
                     the value to append, the append const action may be more appropriate"
                        .to_string(),
                ),
            });
        }
        self.nargs = nargs;
        Ok(self)
    }

    /// Set the const value, stored for `store_const`/`append_const` and for
    /// an optional `?` argument specified without a value.
    pub fn const_value(&mut self, value: impl Into<String>) -> Result<&mut Self, Error> {
        let takes = self.action.takes_values();
        if matches!(self.action, Action::StoreConst | Action::AppendConst)
            || (self.kind == Kind::Optional && self.nargs == Nargs::ZeroOrOne && takes)
        {
            self.const_value = tokens::trim_nonempty(&value.into());
            Ok(self)
        } else if self.kind == Kind::Optional && takes {
            Err(Error::Value("nargs must be '?' to supply const".to_string()))
        } else {
            Err(Error::Type(
                "got an unexpected keyword argument 'const'".to_string(),
            ))
        }
    }

    /// Set the default value.
    ///
    /// `store_true`/`store_false` keep their preset defaults; the call is a
    /// no-op for them.
    pub fn default_value(&mut self, value: impl Into<String>) -> &mut Self {
        if !matches!(self.action, Action::StoreTrue | Action::StoreFalse) {
            self.default_value = tokens::trim_nonempty(&value.into());
        }
        self
    }

    /// Restrict the argument to the given values.
    pub fn choices<I, S>(&mut self, values: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.action.takes_values() {
            return Err(Error::Type(
                "got an unexpected keyword argument 'choices'".to_string(),
            ));
        }
        let mut choices = Vec::new();
        for value in values {
            let value = value.into();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(Error::Value("empty string in choices".to_string()));
            }
            choices.push(trimmed.to_string());
        }
        self.choices = choices;
        Ok(self)
    }

    /// Mark an optional argument as required.
    pub fn required(&mut self, value: bool) -> Result<&mut Self, Error> {
        if self.kind == Kind::Positional {
            return Err(Error::Type(
                "'required' is an invalid argument for positionals".to_string(),
            ));
        }
        self.required = value;
        Ok(self)
    }

    /// Set the help text.
    pub fn help(&mut self, value: impl Into<String>) -> &mut Self {
        self.help = tokens::trim_nonempty(&value.into());
        self.help_suppressed = false;
        self
    }

    /// Hide the argument from usage and help output.
    pub fn suppress(&mut self) -> &mut Self {
        self.help_suppressed = true;
        self
    }

    /// Set the display name used in usage and help output.
    pub fn metavar(&mut self, value: impl Into<String>) -> &mut Self {
        self.metavar = tokens::trim_nonempty(&value.into());
        self
    }

    /// Set the destination key for an optional argument.
    pub fn dest(&mut self, value: impl Into<String>) -> Result<&mut Self, Error> {
        if self.kind == Kind::Positional {
            return Err(Error::Value(
                "cannot set dest for positional argument".to_string(),
            ));
        }
        self.dest = tokens::trim_nonempty(&value.into());
        Ok(self)
    }

    /// Set the text printed by the `version` action.
    pub fn version(&mut self, value: impl Into<String>) -> Result<&mut Self, Error> {
        if self.action != Action::Version {
            return Err(Error::Type(
                "got an unexpected keyword argument 'version'".to_string(),
            ));
        }
        self.version = tokens::trim_nonempty(&value.into());
        Ok(self)
    }

    /// Attach a hook invoked whenever this `store_true` argument is matched.
    pub fn callback(&mut self, func: impl Fn() + Send + Sync + 'static) -> Result<&mut Self, Error> {
        if self.action != Action::StoreTrue {
            return Err(Error::Type(
                "got an unexpected keyword argument 'callback'".to_string(),
            ));
        }
        self.callback = Some(Box::new(func));
        Ok(self)
    }

    pub(crate) fn run_callback(&self) {
        if let Some(callback) = &self.callback {
            callback();
        }
    }

    /// The keys this argument stores under: the dest if set, else the flags.
    pub(crate) fn result_keys(&self) -> Vec<&str> {
        match &self.dest {
            Some(dest) => vec![dest.as_str()],
            None => self.flags.iter().map(String::as_str).collect(),
        }
    }

    /// The argument-level default, falling back to the parser-wide one.
    pub(crate) fn effective_default(&self, fallback: Option<&str>) -> Option<String> {
        self.default_value
            .clone()
            .or_else(|| fallback.map(str::to_string))
    }

    /// The display name: metavar, else the choice set, else the dest or
    /// name (upper-cased for optionals).
    pub(crate) fn argument_name(&self) -> String {
        if let Some(metavar) = &self.metavar {
            return metavar.clone();
        }
        if !self.choices.is_empty() {
            return format!(
                "{{{}}}",
                tokens::join_all(self.choices.iter().map(String::as_str), ",", "")
            );
        }
        let name = self.dest.as_ref().unwrap_or(&self.name);
        match self.kind {
            Kind::Optional => name.to_uppercase(),
            Kind::Positional => name.clone(),
        }
    }

    /// The arity-decorated value names, such as ` [X ...]` for `*`.
    pub(crate) fn nargs_suffix(&self) -> String {
        let name = self.argument_name();
        let lead = match self.kind {
            Kind::Optional => " ",
            Kind::Positional => "",
        };
        match self.nargs {
            Nargs::ZeroOrOne => format!("{lead}[{name}]"),
            Nargs::Any => format!("{lead}[{name} ...]"),
            Nargs::AtLeastOne => format!("{lead}{name} [{name} ...]"),
            Nargs::Precisely(0) => String::new(),
            Nargs::Precisely(n) => {
                let names = vec![name.as_str(); n as usize];
                format!("{lead}{}", tokens::join_all(names, " ", ""))
            }
            Nargs::Default => format!("{lead}{name}"),
        }
    }

    /// The fragment shown on the usage line.
    pub(crate) fn usage_fragment(&self) -> String {
        let mut out = String::new();
        if self.kind == Kind::Optional {
            out.push_str(&self.flags[0]);
        }
        if self.action.displays_values() {
            out.push_str(&self.nargs_suffix());
        }
        out
    }

    /// The flag cell shown in the help block.
    pub(crate) fn flags_cell(&self) -> String {
        match self.kind {
            Kind::Optional => {
                let mut out = String::new();
                for flag in &self.flags {
                    if !out.is_empty() {
                        out.push_str(", ");
                    }
                    out.push_str(flag);
                    if self.action.displays_values() {
                        out.push_str(&self.nargs_suffix());
                    }
                }
                out
            }
            Kind::Positional => self.argument_name(),
        }
    }
}
