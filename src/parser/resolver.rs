//! The token-consumption engine: file expansion, abbreviation resolution,
//! short-flag bundling, option dispatch, positional partitioning, and
//! required-argument enforcement.

use std::collections::HashMap;
use std::fs;

#[cfg(feature = "debug")]
use tracing::debug;

use crate::argument::{Action, Argument, Nargs};
use crate::constant::HELP_FLAGS;
use crate::error::Error;
use crate::namespace::Namespace;
use crate::parser::printer;
use crate::parser::schema::{ArgumentParser, Subparser};
use crate::tokens;

/// A successful resolution: either a complete namespace, or a request to
/// display help/version text and stop with exit code 0.
pub(crate) enum Resolution {
    Complete(Namespace),
    DisplayHelp(String),
    DisplayVersion(String),
}

/// A failed resolution, carrying the usage and program name of the schema
/// that was active when the error arose (the selected child's, after a
/// sub-command dispatch).
pub(crate) struct Failure {
    pub(crate) prog: String,
    pub(crate) usage: String,
    pub(crate) error: Error,
}

pub(crate) fn resolve(
    schema: &ArgumentParser,
    prog: &str,
    tokens: Vec<String>,
) -> Result<Resolution, Failure> {
    Resolver::new(schema, prog)?.run(tokens)
}

struct Resolver<'ap> {
    schema: &'ap ArgumentParser,
    prog: String,
    positional: Vec<&'ap Argument>,
    optional: Vec<&'ap Argument>,
    subparser: Option<(&'ap Subparser, usize)>,
    lead_minimum: usize,
    have_negative_options: bool,
    result: HashMap<String, (Action, Vec<String>)>,
    groups: Vec<Vec<String>>,
    claimed: usize,
    unrecognized: Vec<String>,
    pos: usize,
}

/// The number of values the argument must receive, for partitioning.
fn minimum_values(argument: &Argument) -> usize {
    if !argument.action.takes_values() {
        return 0;
    }
    match argument.nargs {
        Nargs::Default | Nargs::AtLeastOne => 1,
        Nargs::Precisely(n) => n as usize,
        Nargs::ZeroOrOne | Nargs::Any => 0,
    }
}

impl<'ap> Resolver<'ap> {
    fn new(schema: &'ap ArgumentParser, prog: &str) -> Result<Self, Failure> {
        let positional = schema.positional_arguments(true);
        let optional = schema.optional_arguments(true);
        let fail = |error| Failure {
            prog: prog.to_string(),
            usage: printer::render_usage(schema, prog),
            error,
        };

        for argument in positional.iter().chain(optional.iter()) {
            if matches!(argument.action, Action::StoreConst | Action::AppendConst)
                && argument.const_value.is_none()
            {
                return Err(fail(Error::Type(
                    "missing 1 required positional argument: 'const'".to_string(),
                )));
            }
        }

        let have_negative_options = schema.prefix_chars.contains('-')
            && optional
                .iter()
                .any(|argument| argument.flags.iter().any(|flag| tokens::is_negative_number(flag)));

        let mut result: HashMap<String, (Action, Vec<String>)> = HashMap::default();
        for argument in positional.iter().chain(optional.iter()) {
            for key in argument.result_keys() {
                if result
                    .insert(key.to_string(), (argument.action, Vec::default()))
                    .is_some()
                {
                    return Err(fail(Error::Argument(format!(
                        "argument {key}: conflicting option string: {key}"
                    ))));
                }
            }
        }

        let subparser = schema.subparser_info(true);
        if let Some((group, _)) = subparser {
            if let Some(dest) = &group.dest {
                if result
                    .insert(dest.clone(), (Action::Store, Vec::default()))
                    .is_some()
                {
                    return Err(fail(Error::Argument(format!(
                        "argument {dest}: conflicting option string: {dest}"
                    ))));
                }
            }
        }

        let lead_minimum = subparser.map_or(0, |(_, slot)| {
            positional[..slot.min(positional.len())]
                .iter()
                .map(|argument| minimum_values(argument))
                .sum()
        });

        Ok(Self {
            schema,
            prog: prog.to_string(),
            positional,
            optional,
            subparser,
            lead_minimum,
            have_negative_options,
            result,
            groups: Vec::default(),
            claimed: 0,
            unrecognized: Vec::default(),
            pos: 0,
        })
    }

    fn fail(&self, error: Error) -> Failure {
        Failure {
            prog: self.prog.clone(),
            usage: printer::render_usage(self.schema, &self.prog),
            error,
        }
    }

    fn run(mut self, tokens: Vec<String>) -> Result<Resolution, Failure> {
        let tokens = self.expand_files(tokens)?;
        let tokens = self.expand_abbreviations(tokens)?;
        #[cfg(feature = "debug")]
        debug!("resolved token stream: {:?}", tokens);

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i].clone();
            if self.schema.add_help && HELP_FLAGS.contains(&token.as_str()) {
                return Ok(Resolution::DisplayHelp(printer::render_help(
                    self.schema,
                    &self.prog,
                )));
            }
            let (flag, attached) = tokens::split_equals(&token);
            if let Some(argument) = self.optional_by_flag(flag) {
                let flag = flag.to_string();
                if let Some(resolution) =
                    self.consume_option(argument, &flag, attached, &tokens, &mut i)?
                {
                    return Ok(resolution);
                }
            } else if self.have_negative_options && tokens::is_negative_number(&token) {
                self.unrecognized.push(token);
            } else {
                if self.subparser.is_some() && self.claimed >= self.lead_minimum {
                    return self.dispatch(&token, &tokens[i + 1..]);
                }
                let mut values = vec![token];
                while i + 1 < tokens.len() {
                    let next = &tokens[i + 1];
                    if tokens::is_option_token(next, &self.schema.prefix_chars)
                        && (self.have_negative_options || !tokens::is_negative_number(next))
                    {
                        break;
                    }
                    if self.subparser.is_some()
                        && self.claimed + values.len() >= self.lead_minimum
                    {
                        // the next positional token selects the sub-command
                        break;
                    }
                    values.push(next.clone());
                    i += 1;
                }
                self.claimed += values.len();
                self.groups.push(values);
            }
            i += 1;
        }

        self.complete()
    }

    fn complete(mut self) -> Result<Resolution, Failure> {
        let limit = self.positional.len();
        let groups = std::mem::take(&mut self.groups);
        for group in groups {
            self.match_group(group, limit)?;
        }
        self.finalize(limit, false)?;
        Ok(Resolution::Complete(Namespace::new(
            self.result,
            self.schema.prefix_chars.clone(),
        )))
    }

    /// Switch resolution to the selected child schema, feeding it every
    /// remaining token. The parent's positional resolution halts at the
    /// group's slot.
    fn dispatch(mut self, selector: &str, remaining: &[String]) -> Result<Resolution, Failure> {
        let (group, slot) = self
            .subparser
            .expect("internal error - dispatch requires a sub-parser group");
        let limit = slot.min(self.positional.len());
        #[cfg(feature = "debug")]
        debug!(
            "dispatching sub-command '{}' with {} remaining tokens",
            selector,
            remaining.len()
        );

        let groups = std::mem::take(&mut self.groups);
        for tokens in groups {
            self.match_group(tokens, limit)?;
        }
        self.finalize(limit, true)?;

        let Some(child) = group.find(selector) else {
            let message = format!(
                "argument {cell}: invalid choice: '{selector}' (choose from {choices})",
                cell = group.flags_cell(),
                choices = group.choices_list()
            );
            return Err(self.fail(Error::Parse(message)));
        };

        if let Some(dest) = &group.dest {
            self.result
                .get_mut(dest)
                .expect("internal error - the skeleton covers the sub-parser dest")
                .1
                .push(selector.to_string());
        }

        let base = group.prog.as_deref().unwrap_or(&self.prog);
        let child_prog = format!("{base} {selector}");
        match resolve(child, &child_prog, remaining.to_vec())? {
            Resolution::Complete(child_namespace) => {
                for (key, entry) in child_namespace.into_entries() {
                    self.result.insert(key, entry);
                }
                Ok(Resolution::Complete(Namespace::new(
                    self.result,
                    self.schema.prefix_chars.clone(),
                )))
            }
            other => Ok(other),
        }
    }

    fn expand_files(&self, tokens: Vec<String>) -> Result<Vec<String>, Failure> {
        if self.schema.fromfile_prefix_chars.is_empty() {
            return Ok(tokens);
        }
        let mut expanded = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token.chars().next() {
                Some(first) if self.schema.fromfile_prefix_chars.contains(first) => {
                    let path = &token[first.len_utf8()..];
                    let content = fs::read_to_string(path).map_err(|_| {
                        self.fail(Error::Parse(format!(
                            "[Errno 2] No such file or directory: '{path}'"
                        )))
                    })?;
                    expanded.extend(content.lines().map(str::to_string));
                }
                _ => expanded.push(token),
            }
        }
        #[cfg(feature = "debug")]
        debug!("file expansion produced {} tokens", expanded.len());
        Ok(expanded)
    }

    /// Rewrite option-shaped tokens that are not exact keys: resolve
    /// unambiguous abbreviations, then split short-flag bundles.
    fn expand_abbreviations(&self, tokens: Vec<String>) -> Result<Vec<String>, Failure> {
        let mut expanded = Vec::with_capacity(tokens.len());
        for token in tokens {
            let rewrite = !token.is_empty()
                && !self.result.contains_key(&token)
                && tokens::is_option_token(&token, &self.schema.prefix_chars)
                && (self.have_negative_options || !tokens::is_negative_number(&token));
            if !rewrite {
                expanded.push(token);
                continue;
            }

            if self.schema.allow_abbrev {
                let mut candidates: Vec<String> = Vec::default();
                let mut display: Vec<String> = Vec::default();
                let mut prefix_match = false;
                for argument in self.optional.iter().copied() {
                    for flag in &argument.flags {
                        if flag.starts_with(&token) {
                            prefix_match = true;
                            candidates.push(flag.clone());
                            display.push(flag.clone());
                            break;
                        }
                        if flag.len() == 2 && token.starts_with(flag.as_str()) {
                            // a short flag with an attached value, resolved
                            // during bundle separation
                            candidates.push(token.clone());
                            display.push(flag.clone());
                            break;
                        }
                    }
                }
                if candidates.len() > 1 {
                    let listed = tokens::join_all(display.iter().map(String::as_str), ", ", "");
                    return Err(self.fail(Error::Parse(format!(
                        "ambiguous option: '{token}' could match {listed}"
                    ))));
                }
                if prefix_match {
                    expanded.push(
                        candidates
                            .into_iter()
                            .next()
                            .expect("internal error - a prefix match implies a candidate"),
                    );
                } else {
                    let base = candidates.into_iter().next().unwrap_or_else(|| token.clone());
                    let name = tokens::flag_name(&base).to_string();
                    self.separate_bundle(&mut expanded, &token, &name);
                }
            } else {
                let name = tokens::flag_name(&token).to_string();
                self.separate_bundle(&mut expanded, &token, &name);
            }
        }
        Ok(expanded)
    }

    /// Split a single-prefix token into its bundled short flags, attaching
    /// any remainder to the last flag that takes values.
    fn separate_bundle(&self, expanded: &mut Vec<String>, token: &str, name: &str) {
        if name.len() + 1 != token.len() {
            expanded.push(token.to_string());
            return;
        }
        let (flag, attached) = tokens::split_equals(token);
        if attached.is_some() && self.optional_by_flag(flag).is_some() {
            // an exact `-f=value` form
            expanded.push(token.to_string());
            return;
        }

        let mut flags: Vec<String> = Vec::default();
        let chars: Vec<char> = name.chars().collect();
        for (index, single) in chars.iter().enumerate() {
            if *single == '=' {
                let rest: String = chars[index..].iter().collect();
                match flags.last_mut() {
                    Some(last) => last.push_str(&rest),
                    None => flags.push(rest),
                }
                break;
            }

            let mut matched: Option<&Argument> = None;
            'search: for argument in self.optional.iter().copied() {
                for flag in &argument.flags {
                    if flag.len() == 2 && flag.ends_with(*single) {
                        flags.push(flag.clone());
                        matched = Some(argument);
                        break 'search;
                    }
                }
            }

            match matched {
                None => {
                    if flags.is_empty() {
                        flags.push(token.to_string());
                    } else {
                        let rest: String = chars[index..].iter().collect();
                        let last = flags
                            .last_mut()
                            .expect("internal error - flags is non-empty");
                        if !rest.starts_with('=') {
                            last.push('=');
                        }
                        last.push_str(&rest);
                    }
                    break;
                }
                Some(argument) if argument.action.takes_values() => {
                    let rest: String = chars[index + 1..].iter().collect();
                    if !rest.is_empty() {
                        let last = flags
                            .last_mut()
                            .expect("internal error - flags is non-empty");
                        if !rest.starts_with('=') {
                            last.push('=');
                        }
                        last.push_str(&rest);
                    }
                    break;
                }
                Some(_) => {}
            }
        }
        expanded.extend(flags);
    }

    fn optional_by_flag(&self, key: &str) -> Option<&'ap Argument> {
        self.optional
            .iter()
            .copied()
            .find(|argument| argument.flags.iter().any(|flag| flag == key))
    }

    fn optional_by_dest(&self, key: &str) -> Option<&'ap Argument> {
        self.optional.iter().copied().find(|argument| {
            argument.dest.as_deref() == Some(key)
                || argument.flags.iter().any(|flag| flag == key)
        })
    }

    fn consume_option(
        &mut self,
        argument: &'ap Argument,
        flag: &str,
        attached: Option<&str>,
        tokens: &[String],
        i: &mut usize,
    ) -> Result<Option<Resolution>, Failure> {
        match argument.action {
            Action::Store | Action::Append | Action::Extend => {
                if argument.action == Action::Store {
                    // later specifications overwrite earlier ones
                    for key in argument.result_keys() {
                        self.result
                            .get_mut(key)
                            .expect("internal error - the skeleton covers every key")
                            .1
                            .clear();
                    }
                }
                match attached {
                    Some(value) => {
                        if let Nargs::Precisely(n) = argument.nargs {
                            if n > 1 {
                                return Err(self.fail(Error::Parse(format!(
                                    "argument {flag}: expected {n} arguments"
                                ))));
                            }
                        }
                        if value.is_empty() {
                            return Err(self.fail(Error::Parse(format!(
                                "argument {flag}: expected one argument"
                            ))));
                        }
                        self.store_value(argument, value)?;
                    }
                    None => self.consume_values(argument, flag, tokens, i)?,
                }
            }
            Action::StoreConst | Action::StoreTrue | Action::StoreFalse => {
                self.reject_attached(flag, attached)?;
                self.store_const(argument);
                if argument.action == Action::StoreTrue {
                    argument.run_callback();
                }
            }
            Action::AppendConst => {
                self.reject_attached(flag, attached)?;
                self.append_const(argument)?;
            }
            Action::Count => {
                self.reject_attached(flag, attached)?;
                self.store_count(argument);
            }
            Action::Help => {
                self.reject_attached(flag, attached)?;
                return Ok(Some(Resolution::DisplayHelp(printer::render_help(
                    self.schema,
                    &self.prog,
                ))));
            }
            Action::Version => {
                self.reject_attached(flag, attached)?;
                let version = argument.version.clone().ok_or_else(|| {
                    self.fail(Error::Attribute(
                        "'ArgumentParser' object has no attribute 'version'".to_string(),
                    ))
                })?;
                return Ok(Some(Resolution::DisplayVersion(version)));
            }
        }
        Ok(None)
    }

    fn reject_attached(&self, flag: &str, attached: Option<&str>) -> Result<(), Failure> {
        match attached {
            Some(value) => Err(self.fail(Error::Parse(format!(
                "argument {flag}: ignored explicit argument '{value}'"
            )))),
            None => Ok(()),
        }
    }

    /// Consume following tokens up to the argument's arity.
    fn consume_values(
        &mut self,
        argument: &'ap Argument,
        flag: &str,
        tokens: &[String],
        i: &mut usize,
    ) -> Result<(), Failure> {
        let mut taken = 0usize;
        loop {
            let available = tokens.get(*i + 1).map_or(false, |next| {
                !tokens::is_option_token(next, &self.schema.prefix_chars)
                    || (!self.have_negative_options && tokens::is_negative_number(next))
            });
            if !available {
                if taken == 0 {
                    match argument.nargs {
                        Nargs::Default => {
                            return Err(self.fail(Error::Parse(format!(
                                "argument {flag}: expected one argument"
                            ))));
                        }
                        Nargs::ZeroOrOne => {
                            let value = argument.const_value.clone().unwrap_or_default();
                            self.store_value(argument, &value)?;
                        }
                        Nargs::Any => {}
                        Nargs::AtLeastOne => {
                            return Err(self.fail(Error::Parse(format!(
                                "argument {flag}: expected at least one argument"
                            ))));
                        }
                        Nargs::Precisely(n) => {
                            return Err(self.fail(Error::Parse(format!(
                                "argument {flag}: expected {n} arguments"
                            ))));
                        }
                    }
                } else if let Nargs::Precisely(n) = argument.nargs {
                    if taken < n as usize {
                        return Err(self.fail(Error::Parse(format!(
                            "argument {flag}: expected {n} arguments"
                        ))));
                    }
                }
                return Ok(());
            }

            *i += 1;
            let value = tokens[*i].clone();
            self.store_value(argument, &value)?;
            taken += 1;

            match argument.nargs {
                // at most one value
                Nargs::Default | Nargs::ZeroOrOne => return Ok(()),
                Nargs::Precisely(n) if taken == n as usize => return Ok(()),
                _ => {}
            }
        }
    }

    fn store_value(&mut self, argument: &Argument, value: &str) -> Result<(), Failure> {
        if !argument.choices.is_empty() {
            let stripped = tokens::remove_quotes(value);
            if !argument.choices.iter().any(|choice| choice == stripped) {
                let listed =
                    tokens::join_all(argument.choices.iter().map(String::as_str), ", ", "'");
                let message = format!(
                    "argument {flag}: invalid choice: '{stripped}' (choose from {listed})",
                    flag = argument.flags[0]
                );
                return Err(self.fail(Error::Parse(message)));
            }
        }
        for key in argument.result_keys() {
            self.result
                .get_mut(key)
                .expect("internal error - the skeleton covers every key")
                .1
                .push(value.to_string());
        }
        Ok(())
    }

    fn store_const(&mut self, argument: &Argument) {
        let value = argument.const_value.clone().unwrap_or_default();
        for key in argument.result_keys() {
            let values = &mut self
                .result
                .get_mut(key)
                .expect("internal error - the skeleton covers every key")
                .1;
            if values.is_empty() {
                values.push(value.clone());
            }
        }
    }

    fn append_const(&mut self, argument: &Argument) -> Result<(), Failure> {
        if let Some(default) = &argument.default_value {
            let message = format!(
                "argument {flag}: ignored default value '{default}'",
                flag = argument.flags[0]
            );
            return Err(self.fail(Error::Parse(message)));
        }
        let value = argument.const_value.clone().unwrap_or_default();
        for key in argument.result_keys() {
            self.result
                .get_mut(key)
                .expect("internal error - the skeleton covers every key")
                .1
                .push(value.clone());
        }
        Ok(())
    }

    fn store_count(&mut self, argument: &Argument) {
        for key in argument.result_keys() {
            self.result
                .get_mut(key)
                .expect("internal error - the skeleton covers every key")
                .1
                .push(String::default());
        }
    }

    /// Store the default for a `?`/`*` positional left without tokens.
    fn store_default(&mut self, argument: &Argument) {
        if argument.action != Action::Store {
            return;
        }
        let value = argument
            .effective_default(self.schema.argument_default.as_deref())
            .unwrap_or_default();
        for key in argument.result_keys() {
            let values = &mut self
                .result
                .get_mut(key)
                .expect("internal error - the skeleton covers every key")
                .1;
            if values.is_empty() {
                values.push(value.clone());
            }
        }
    }

    /// Satisfy a const/flag/count positional in place.
    fn stored_in_place(&mut self, argument: &Argument) -> Result<bool, Failure> {
        match argument.action {
            Action::StoreConst | Action::StoreTrue | Action::StoreFalse => {
                self.store_const(argument);
                Ok(true)
            }
            Action::AppendConst => {
                self.append_const(argument)?;
                Ok(true)
            }
            Action::Count => {
                self.store_count(argument);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Assign one accumulated run of positional tokens to the remaining
    /// positional slots before `limit`.
    fn match_group(&mut self, group: Vec<String>, limit: usize) -> Result<(), Failure> {
        if self.pos >= limit {
            self.unrecognized.extend(group);
            return Ok(());
        }

        // The longest window of slots whose minimum demand fits the group.
        let mut finish = self.pos;
        let mut min_args = 0usize;
        let mut one_slots = 0usize;
        let mut greedy = false;
        while finish < limit {
            let argument = self.positional[finish];
            if !argument.action.takes_values() {
                finish += 1;
                continue;
            }
            let mut minimum = 0usize;
            match argument.nargs {
                Nargs::Default => minimum = 1,
                Nargs::AtLeastOne => {
                    minimum = 1;
                    greedy = true;
                }
                Nargs::ZeroOrOne => one_slots += 1,
                Nargs::Any => greedy = true,
                Nargs::Precisely(n) => minimum = n as usize,
            }
            if min_args + minimum > group.len() {
                break;
            }
            min_args += minimum;
            finish += 1;
        }

        if finish == self.pos {
            self.unrecognized.extend(group);
            return Ok(());
        }

        if min_args == group.len() {
            // every slot consumes exactly its minimum
            let mut i = 0;
            while self.pos < finish {
                let argument = self.positional[self.pos];
                self.pos += 1;
                if self.stored_in_place(argument)? {
                    continue;
                }
                match argument.nargs {
                    Nargs::Default | Nargs::AtLeastOne => {
                        self.store_value(argument, &group[i])?;
                        i += 1;
                    }
                    Nargs::ZeroOrOne | Nargs::Any => self.store_default(argument),
                    Nargs::Precisely(n) => {
                        for _ in 0..n {
                            self.store_value(argument, &group[i])?;
                            i += 1;
                        }
                    }
                }
            }
        } else if greedy {
            // the first greedy slot absorbs the surplus
            let mut surplus = group.len() - min_args;
            let mut i = 0;
            while self.pos < finish {
                let argument = self.positional[self.pos];
                self.pos += 1;
                if self.stored_in_place(argument)? {
                    continue;
                }
                match argument.nargs {
                    Nargs::Default => {
                        self.store_value(argument, &group[i])?;
                        i += 1;
                    }
                    Nargs::AtLeastOne => {
                        self.store_value(argument, &group[i])?;
                        i += 1;
                        while surplus > 0 {
                            self.store_value(argument, &group[i])?;
                            i += 1;
                            surplus -= 1;
                        }
                    }
                    Nargs::ZeroOrOne => self.store_default(argument),
                    Nargs::Any => {
                        if surplus > 0 {
                            while surplus > 0 {
                                self.store_value(argument, &group[i])?;
                                i += 1;
                                surplus -= 1;
                            }
                        } else {
                            self.store_default(argument);
                        }
                    }
                    Nargs::Precisely(n) => {
                        for _ in 0..n {
                            self.store_value(argument, &group[i])?;
                            i += 1;
                        }
                    }
                }
            }
        } else if min_args + one_slots >= group.len() {
            // distribute the surplus into `?` slots left to right
            let mut over = min_args + one_slots - group.len();
            let mut i = 0;
            while self.pos < finish {
                let argument = self.positional[self.pos];
                self.pos += 1;
                if self.stored_in_place(argument)? {
                    continue;
                }
                match argument.nargs {
                    Nargs::Default => {
                        self.store_value(argument, &group[i])?;
                        i += 1;
                    }
                    Nargs::ZeroOrOne => {
                        if over < one_slots {
                            self.store_value(argument, &group[i])?;
                            i += 1;
                            over += 1;
                        } else {
                            self.store_default(argument);
                        }
                    }
                    Nargs::Precisely(n) => {
                        for _ in 0..n {
                            self.store_value(argument, &group[i])?;
                            i += 1;
                        }
                    }
                    Nargs::Any | Nargs::AtLeastOne => {
                        unreachable!("internal error - greedy slots take the surplus branch")
                    }
                }
            }
        } else {
            // undersupplied: consume minimums from the left, the leftovers
            // are unrecognized
            let mut i = 0;
            while self.pos < finish {
                let argument = self.positional[self.pos];
                self.pos += 1;
                if self.stored_in_place(argument)? {
                    continue;
                }
                match argument.nargs {
                    Nargs::Default | Nargs::ZeroOrOne => {
                        self.store_value(argument, &group[i])?;
                        i += 1;
                    }
                    Nargs::Precisely(n) => {
                        for _ in 0..n {
                            self.store_value(argument, &group[i])?;
                            i += 1;
                        }
                    }
                    Nargs::Any | Nargs::AtLeastOne => {
                        unreachable!("internal error - greedy slots take the surplus branch")
                    }
                }
            }
            while i < group.len() {
                self.unrecognized.push(group[i].clone());
                i += 1;
            }
        }

        Ok(())
    }

    fn finalize(&mut self, limit: usize, dispatched: bool) -> Result<(), Failure> {
        let mut required_flags: Vec<String> = Vec::default();
        for argument in self.optional.iter().copied() {
            if !argument.required {
                continue;
            }
            let missing = argument.result_keys().iter().any(|key| {
                self.result
                    .get(*key)
                    .expect("internal error - the skeleton covers every key")
                    .1
                    .is_empty()
            });
            if missing {
                required_flags.push(tokens::join_all(
                    argument.flags.iter().map(String::as_str),
                    "/",
                    "",
                ));
            }
        }

        let mut missing: Vec<String> = Vec::default();
        while self.pos < limit {
            let argument = self.positional[self.pos];
            self.pos += 1;
            if missing.is_empty() {
                if self.stored_in_place(argument)? {
                    continue;
                }
                if matches!(argument.nargs, Nargs::ZeroOrOne | Nargs::Any) {
                    self.store_default(argument);
                    continue;
                }
            }
            missing.push(argument.flags[0].clone());
        }
        if !dispatched {
            if let Some((group, _)) = self.subparser {
                if group.required {
                    missing.push(group.flags_cell());
                }
            }
        }
        missing.extend(required_flags);
        if !missing.is_empty() {
            let listed = tokens::join_all(missing.iter().map(String::as_str), ", ", "");
            return Err(self.fail(Error::Parse(format!(
                "the following arguments are required: {listed}"
            ))));
        }

        if !self.unrecognized.is_empty() {
            let listed = tokens::join_all(self.unrecognized.iter().map(String::as_str), " ", "");
            return Err(self.fail(Error::Parse(format!("unrecognized arguments: {listed}"))));
        }

        // materialize defaults for optionals that received nothing
        let keys: Vec<String> = self.result.keys().cloned().collect();
        for key in keys {
            let (action, values) = self
                .result
                .get(&key)
                .expect("internal error - keys were just read");
            if !values.is_empty() || *action == Action::Count {
                continue;
            }
            let Some(argument) = self.optional_by_dest(&key) else {
                continue;
            };
            if let Some(value) =
                argument.effective_default(self.schema.argument_default.as_deref())
            {
                self.result
                    .get_mut(&key)
                    .expect("internal error - keys were just read")
                    .1
                    .push(value);
            }
        }

        Ok(())
    }
}
