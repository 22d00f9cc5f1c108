use std::env;
use std::process;

use crate::argument::{Action, Argument, Kind};
use crate::constant::HELP_NAME;
use crate::error::Error;
use crate::namespace::Namespace;
use crate::parser::{printer, resolver, ConsoleInterface, UserInterface};
use crate::tokens;

/// Flag inputs accepted by [`ArgumentParser::add_argument`]: a single flag
/// string or a sequence of them.
pub trait IntoFlags {
    /// Convert into the declared flag strings.
    fn into_flags(self) -> Vec<String>;
}

impl IntoFlags for &str {
    fn into_flags(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoFlags for String {
    fn into_flags(self) -> Vec<String> {
        vec![self]
    }
}

impl<const N: usize> IntoFlags for [&str; N] {
    fn into_flags(self) -> Vec<String> {
        self.iter().map(|flag| flag.to_string()).collect()
    }
}

impl IntoFlags for &[&str] {
    fn into_flags(self) -> Vec<String> {
        self.iter().map(|flag| flag.to_string()).collect()
    }
}

impl IntoFlags for Vec<String> {
    fn into_flags(self) -> Vec<String> {
        self
    }
}

impl IntoFlags for Vec<&str> {
    fn into_flags(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

/// A declarative command line parser: scalar settings, an ordered argument
/// schema, optional parent schemas, and at most one sub-parser group.
///
/// Build the schema, then call [`parse_args`](Self::parse_args) or
/// [`parse_args_from`](Self::parse_args_from) to resolve a token sequence
/// into a [`Namespace`]. The schema is immutable during parsing; repeated
/// parses yield independent namespaces.
#[derive(Debug)]
pub struct ArgumentParser {
    pub(crate) prog: String,
    pub(crate) usage: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) epilog: Option<String>,
    pub(crate) parents: Vec<ArgumentParser>,
    pub(crate) prefix_chars: String,
    pub(crate) fromfile_prefix_chars: String,
    pub(crate) argument_default: Option<String>,
    pub(crate) add_help: bool,
    pub(crate) allow_abbrev: bool,
    pub(crate) exit_on_error: bool,
    pub(crate) captured: Vec<String>,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) subparsers: Option<Subparser>,
    pub(crate) subparser_pos: usize,
    pub(crate) help_argument: Argument,
}

impl ArgumentParser {
    /// Create a parser with the given program name.
    pub fn new(prog: impl Into<String>) -> Self {
        let mut help_argument = Argument::new(
            vec!["-h".to_string(), "--help".to_string()],
            HELP_NAME.to_string(),
            Kind::Optional,
        );
        help_argument.help("show this help message and exit");
        help_argument
            .action(Action::StoreTrue)
            .expect("internal error - store_true is valid for an optional");

        Self {
            prog: prog.into(),
            usage: None,
            description: None,
            epilog: None,
            parents: Vec::default(),
            prefix_chars: "-".to_string(),
            fromfile_prefix_chars: String::default(),
            argument_default: None,
            add_help: true,
            allow_abbrev: true,
            exit_on_error: true,
            captured: Vec::default(),
            arguments: Vec::default(),
            subparsers: None,
            subparser_pos: 0,
            help_argument,
        }
    }

    /// Create a parser named after the invoking program, capturing its
    /// arguments (the leading program path is skipped).
    pub fn from_env() -> Self {
        let mut args = env::args();
        let prog = args
            .next()
            .map(|arg0| tokens::base_name(&arg0).to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let mut parser = Self::new(prog);
        parser.captured = args.collect();
        parser
    }

    /// Override the program name shown in usage and help.
    pub fn prog(&mut self, value: impl Into<String>) -> &mut Self {
        if let Some(value) = tokens::trim_nonempty(&value.into()) {
            self.prog = value;
        }
        self
    }

    /// Override the generated usage line.
    pub fn usage(&mut self, value: impl Into<String>) -> &mut Self {
        self.usage = tokens::trim_nonempty(&value.into());
        self
    }

    /// Text shown between the usage line and the argument sections.
    pub fn description(&mut self, value: impl Into<String>) -> &mut Self {
        self.description = tokens::trim_nonempty(&value.into());
        self
    }

    /// Text shown after the argument sections.
    pub fn epilog(&mut self, value: impl Into<String>) -> &mut Self {
        self.epilog = tokens::trim_nonempty(&value.into());
        self
    }

    /// Inherit the arguments (and any sub-parser group) of other schemas.
    ///
    /// Parents contribute their arguments ahead of this parser's own, in
    /// order. Parents keeping their automatic `-h`/`--help` conflict with
    /// this parser's; build them with `add_help(false)`.
    pub fn parents(&mut self, parents: Vec<ArgumentParser>) -> &mut Self {
        self.parents = parents;
        self
    }

    /// The characters legal as option prefixes (default `-`).
    pub fn prefix_chars(&mut self, value: impl Into<String>) -> &mut Self {
        if let Some(value) = tokens::trim_nonempty(&value.into()) {
            self.prefix_chars = value;
        }
        self
    }

    /// Characters marking a token as a file expansion: the rest of the
    /// token names a file whose lines are spliced in as tokens.
    pub fn fromfile_prefix_chars(&mut self, value: impl Into<String>) -> &mut Self {
        self.fromfile_prefix_chars = value.into().trim().to_string();
        self
    }

    /// A parser-wide fallback default value.
    pub fn argument_default(&mut self, value: impl Into<String>) -> &mut Self {
        self.argument_default = tokens::trim_nonempty(&value.into());
        self
    }

    /// Whether `-h`/`--help` is injected automatically (default true).
    pub fn add_help(&mut self, value: bool) -> &mut Self {
        self.add_help = value;
        self
    }

    /// Whether unambiguous prefixes of long flags are accepted (default
    /// true).
    pub fn allow_abbrev(&mut self, value: bool) -> &mut Self {
        self.allow_abbrev = value;
        self
    }

    /// Whether parse errors print usage and terminate the process, instead
    /// of being returned to the caller (default true).
    pub fn exit_on_error(&mut self, value: bool) -> &mut Self {
        self.exit_on_error = value;
        self
    }

    /// Declare an argument from one flag or a sequence of flags.
    ///
    /// The first flag decides the kind: a leading prefix character makes an
    /// optional, anything else a positional (which allows exactly one
    /// flag). The canonical name is the body of the flag with the most
    /// prefix characters, first-seen winning ties.
    pub fn add_argument<F: IntoFlags>(&mut self, flags: F) -> Result<&mut Argument, Error> {
        let argument = build_argument(flags.into_flags(), &self.prefix_chars)?;
        self.arguments.push(argument);
        Ok(self
            .arguments
            .last_mut()
            .expect("internal error - the argument was just pushed"))
    }

    /// Declare the sub-parser group, bound at the current positional index.
    ///
    /// Only one group may exist across the schema and its transitive
    /// parents.
    pub fn add_subparsers(&mut self) -> Result<&mut Subparser, Error> {
        if self.has_subparsers() {
            return Err(Error::Argument(
                "cannot have multiple subparser arguments".to_string(),
            ));
        }
        self.subparser_pos = self
            .arguments
            .iter()
            .filter(|argument| argument.kind == Kind::Positional)
            .count();
        self.subparsers = Some(Subparser::new(self.prefix_chars.clone()));
        Ok(self
            .subparsers
            .as_mut()
            .expect("internal error - the group was just created"))
    }

    fn has_subparsers(&self) -> bool {
        self.subparsers.is_some() || self.parents.iter().any(ArgumentParser::has_subparsers)
    }

    /// The default value registered for a dest or flag, if any.
    pub fn get_default(&self, dest: &str) -> Option<String> {
        let fallback = self.argument_default.as_deref();
        for argument in self.positional_arguments(true) {
            if argument.flags.iter().any(|flag| flag == dest) {
                return argument.effective_default(fallback);
            }
        }
        for argument in self.optional_arguments(true) {
            if let Some(declared) = &argument.dest {
                if declared == dest {
                    return argument.effective_default(fallback);
                }
            } else if argument
                .flags
                .iter()
                .any(|flag| flag == dest || tokens::flag_name(flag) == dest)
            {
                return argument.effective_default(fallback);
            }
        }
        None
    }

    /// The flattened positional arguments: parents first (recursively, in
    /// order), then this schema's own.
    pub(crate) fn positional_arguments(&self, include_suppressed: bool) -> Vec<&Argument> {
        let mut result = Vec::default();
        for parent in &self.parents {
            result.extend(parent.positional_arguments(include_suppressed));
        }
        for argument in &self.arguments {
            if argument.kind == Kind::Positional && (include_suppressed || !argument.help_suppressed)
            {
                result.push(argument);
            }
        }
        result
    }

    /// The flattened optional arguments, led by the automatic help
    /// argument when `add_help` is set.
    pub(crate) fn optional_arguments(&self, include_suppressed: bool) -> Vec<&Argument> {
        let mut result = Vec::default();
        if self.add_help {
            result.push(&self.help_argument);
        }
        for parent in &self.parents {
            result.extend(parent.optional_arguments(include_suppressed));
        }
        for argument in &self.arguments {
            if argument.kind == Kind::Optional && (include_suppressed || !argument.help_suppressed) {
                result.push(argument);
            }
        }
        result
    }

    /// The sub-parser group and its index into the flattened positional
    /// sequence. Walks the parents in order and returns the first group
    /// declared.
    pub(crate) fn subparser_info(&self, include_suppressed: bool) -> Option<(&Subparser, usize)> {
        if let Some(group) = &self.subparsers {
            let mut index = 0;
            for parent in &self.parents {
                index += parent.positional_arguments(include_suppressed).len();
            }
            index += self.own_positionals_before(self.subparser_pos, include_suppressed);
            return Some((group, index));
        }
        for (position, parent) in self.parents.iter().enumerate() {
            if let Some((group, inner)) = parent.subparser_info(include_suppressed) {
                let mut index = inner;
                for earlier in &self.parents[..position] {
                    index += earlier.positional_arguments(include_suppressed).len();
                }
                return Some((group, index));
            }
        }
        None
    }

    fn own_positionals_before(&self, limit: usize, include_suppressed: bool) -> usize {
        let mut seen = 0;
        let mut count = 0;
        for argument in &self.arguments {
            if seen == limit {
                break;
            }
            if argument.kind == Kind::Positional {
                seen += 1;
                if include_suppressed || !argument.help_suppressed {
                    count += 1;
                }
            }
        }
        count
    }

    /// The generated (or overridden) usage line.
    pub fn format_usage(&self) -> String {
        printer::render_usage(self, &self.prog)
    }

    /// The full help message.
    pub fn format_help(&self) -> String {
        printer::render_help(self, &self.prog)
    }

    /// Print the usage line to stdout.
    pub fn print_usage(&self) {
        println!("{}", self.format_usage());
    }

    /// Print the help message to stdout.
    pub fn print_help(&self) {
        println!("{}", self.format_help());
    }

    /// Parse the captured program arguments (see [`from_env`](Self::from_env)).
    pub fn parse_args(&self) -> Result<Namespace, Error> {
        self.parse_args_from(self.captured.clone())
    }

    /// Parse an explicit token sequence into a [`Namespace`].
    ///
    /// `--help` and the `version` action print and terminate the process
    /// with exit code 0. Errors follow the `exit_on_error` policy: print
    /// usage plus `<prog>: error: <message>` to stderr and terminate with a
    /// non-zero code, or surface the [`Error`] to the caller.
    pub fn parse_args_from<I, S>(&self, tokens: I) -> Result<Namespace, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match self.parse_tokens(tokens, &ConsoleInterface::default()) {
            ParseResult::Complete(namespace) => Ok(namespace),
            ParseResult::Exit(code) => process::exit(code),
            ParseResult::Raise(error) => Err(error),
        }
    }

    pub(crate) fn parse_tokens(
        &self,
        tokens: Vec<String>,
        interface: &dyn UserInterface,
    ) -> ParseResult {
        match resolver::resolve(self, &self.prog, tokens) {
            Ok(resolver::Resolution::Complete(namespace)) => ParseResult::Complete(namespace),
            Ok(resolver::Resolution::DisplayHelp(help)) => {
                interface.print(help);
                ParseResult::Exit(0)
            }
            Ok(resolver::Resolution::DisplayVersion(version)) => {
                interface.print(version);
                ParseResult::Exit(0)
            }
            Err(failure) => {
                if self.exit_on_error {
                    interface.print_error(failure.usage);
                    interface.print_error(format!(
                        "{prog}: error: {error}",
                        prog = failure.prog,
                        error = failure.error
                    ));
                    ParseResult::Exit(1)
                } else {
                    ParseResult::Raise(failure.error)
                }
            }
        }
    }
}

#[derive(Debug)]
pub(crate) enum ParseResult {
    Complete(Namespace),
    Exit(i32),
    Raise(Error),
}

fn build_argument(mut flags: Vec<String>, prefix_chars: &str) -> Result<Argument, Error> {
    if flags.is_empty() {
        return Err(Error::Value("empty options".to_string()));
    }
    flags[0] = flags[0].trim().to_string();
    if flags[0].is_empty() {
        return Err(Error::Index("string index out of range".to_string()));
    }

    let mut name = flags[0].clone();
    let mut prefixes = 0;
    let optional = tokens::is_option_token(&flags[0], prefix_chars);
    if optional {
        update_name(&flags[0], &mut name, &mut prefixes);
    } else if flags.len() > 1 {
        // no positional multiflag
        return Err(Error::Value(format!(
            "invalid option string {flag}: must start with a character '{prefix_chars}'",
            flag = flags[0]
        )));
    }
    for flag in flags.iter().skip(1) {
        if flag.is_empty() {
            return Err(Error::Index("string index out of range".to_string()));
        }
        if !tokens::is_option_token(flag, prefix_chars) {
            return Err(Error::Value(format!(
                "invalid option string {flag}: must start with a character '{prefix_chars}'"
            )));
        }
        update_name(flag, &mut name, &mut prefixes);
    }

    let kind = if optional {
        Kind::Optional
    } else {
        Kind::Positional
    };
    Ok(Argument::new(flags, name, kind))
}

fn update_name(flag: &str, name: &mut String, prefixes: &mut usize) {
    let body = tokens::flag_name(flag);
    let count = flag.len() - body.len();
    if *prefixes < count {
        *prefixes = count;
        *name = body.to_string();
    }
}

/// A named, ordered collection of child parsers bound at a position in the
/// owning schema's positional sequence.
#[derive(Debug)]
pub struct Subparser {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) prog: Option<String>,
    pub(crate) dest: Option<String>,
    pub(crate) required: bool,
    pub(crate) help: Option<String>,
    pub(crate) metavar: Option<String>,
    pub(crate) prefix_chars: String,
    pub(crate) parsers: Vec<ArgumentParser>,
}

impl Subparser {
    pub(crate) fn new(prefix_chars: String) -> Self {
        Self {
            title: None,
            description: None,
            prog: None,
            dest: None,
            required: false,
            help: None,
            metavar: None,
            prefix_chars,
            parsers: Vec::default(),
        }
    }

    /// Title of the sub-command section in help output.
    pub fn title(&mut self, value: impl Into<String>) -> &mut Self {
        self.title = tokens::trim_nonempty(&value.into());
        self
    }

    /// Description shown under the section title.
    pub fn description(&mut self, value: impl Into<String>) -> &mut Self {
        self.description = tokens::trim_nonempty(&value.into());
        self
    }

    /// Base program name for the child parsers (defaults to the owning
    /// parser's).
    pub fn prog(&mut self, value: impl Into<String>) -> &mut Self {
        self.prog = tokens::trim_nonempty(&value.into());
        self
    }

    /// Namespace key under which the selected sub-command name is stored.
    pub fn dest(&mut self, value: impl Into<String>) -> &mut Self {
        self.dest = tokens::trim_nonempty(&value.into());
        self
    }

    /// Whether selecting a sub-command is mandatory.
    pub fn required(&mut self, value: bool) -> &mut Self {
        self.required = value;
        self
    }

    /// Help text for the group's entry in the help block.
    pub fn help(&mut self, value: impl Into<String>) -> &mut Self {
        self.help = tokens::trim_nonempty(&value.into());
        self
    }

    /// Display name for the group in usage and help.
    pub fn metavar(&mut self, value: impl Into<String>) -> &mut Self {
        self.metavar = tokens::trim_nonempty(&value.into());
        self
    }

    /// Add a child parser under the given sub-command name.
    pub fn add_parser(&mut self, name: impl Into<String>) -> &mut ArgumentParser {
        let mut parser = ArgumentParser::new(name);
        parser.prefix_chars = self.prefix_chars.clone();
        self.parsers.push(parser);
        self.parsers
            .last_mut()
            .expect("internal error - the parser was just pushed")
    }

    pub(crate) fn find(&self, name: &str) -> Option<&ArgumentParser> {
        self.parsers.iter().find(|parser| parser.prog == name)
    }

    pub(crate) fn flags_cell(&self) -> String {
        if let Some(metavar) = &self.metavar {
            return metavar.clone();
        }
        format!(
            "{{{}}}",
            tokens::join_all(self.parsers.iter().map(|parser| parser.prog.as_str()), ",", "")
        )
    }

    pub(crate) fn usage_fragment(&self) -> String {
        format!("{} ...", self.flags_cell())
    }

    pub(crate) fn choices_list(&self) -> String {
        tokens::join_all(
            self.parsers.iter().map(|parser| parser.prog.as_str()),
            ", ",
            "'",
        )
    }
}
