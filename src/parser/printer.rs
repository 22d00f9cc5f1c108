//! Lays out the usage line and the aligned help block.

use crate::constant::{HELP_COLUMN, USAGE_HEADER, USAGE_LIMIT};
use crate::parser::schema::ArgumentParser;

/// Render the usage line(s), wrapped at the column budget.
///
/// Fragments are never split: a wrapped line starts at the continuation
/// column and carries whole `[optional]`/`positional` fragments only.
pub(crate) fn render_usage(schema: &ArgumentParser, prog: &str) -> String {
    if let Some(usage) = &schema.usage {
        return format!("{USAGE_HEADER}{usage}");
    }

    let positional = schema.positional_arguments(false);
    let optional = schema.optional_arguments(false);

    let mut fragments: Vec<String> = optional
        .iter()
        .map(|argument| format!("[{}]", argument.usage_fragment()))
        .collect();
    let mut trailing: Vec<String> = positional
        .iter()
        .map(|argument| argument.usage_fragment())
        .collect();
    if let Some((group, slot)) = schema.subparser_info(false) {
        trailing.insert(slot.min(trailing.len()), group.usage_fragment());
    }
    fragments.extend(trailing);
    fragments.retain(|fragment| !fragment.is_empty() && fragment != "[]");

    let header = format!("{USAGE_HEADER}{prog}");
    if fragments.is_empty() {
        return header;
    }

    let widest = fragments
        .iter()
        .map(|fragment| fragment.len())
        .max()
        .expect("internal error - fragments is non-empty");
    let mut lines: Vec<String> = Vec::new();
    let mut current = header;
    let mut bare = false;
    let continuation = if current.len() + 1 + widest <= USAGE_LIMIT {
        current.len() + 1
    } else {
        // Not even the widest fragment fits beside the program name, so
        // every fragment goes below it at the continuation column.
        lines.push(std::mem::replace(&mut current, " ".repeat(USAGE_HEADER.len())));
        bare = true;
        USAGE_HEADER.len()
    };

    for fragment in &fragments {
        if bare {
            current.push_str(fragment);
            bare = false;
        } else if current.len() + 1 + fragment.len() <= USAGE_LIMIT {
            current.push(' ');
            current.push_str(fragment);
        } else {
            lines.push(std::mem::replace(&mut current, " ".repeat(continuation)));
            current.push_str(fragment);
        }
    }
    lines.push(current);
    lines.join("\n")
}

/// Render the full help message: usage, description, the argument
/// sections, the sub-command section, and the epilog.
pub(crate) fn render_help(schema: &ArgumentParser, prog: &str) -> String {
    let mut lines: Vec<String> = vec![render_usage(schema, prog)];

    if let Some(description) = &schema.description {
        lines.push(String::new());
        lines.push(description.clone());
    }

    let positional = schema.positional_arguments(false);
    let optional = schema.optional_arguments(false);
    let subparser = schema.subparser_info(false);
    // An untitled, undescribed group reads as the tail of the positionals.
    let inline_group = subparser
        .map_or(false, |(group, _)| group.title.is_none() && group.description.is_none());

    let mut widest = 0;
    if let Some((group, _)) = subparser {
        widest = widest.max(group.flags_cell().len());
    }
    for argument in positional.iter().chain(optional.iter()) {
        widest = widest.max(argument.flags_cell().len());
    }
    let column = (widest + 4).min(HELP_COLUMN);

    if !positional.is_empty() || inline_group {
        lines.push(String::new());
        lines.push("positional arguments:".to_string());
        for (index, argument) in positional.iter().enumerate() {
            if inline_group {
                if let Some((group, slot)) = subparser {
                    if slot == index {
                        lines.push(entry(&group.flags_cell(), group.help.as_deref(), column));
                    }
                }
            }
            lines.push(entry(
                &argument.flags_cell(),
                argument.help.as_deref(),
                column,
            ));
        }
        if inline_group {
            if let Some((group, slot)) = subparser {
                if slot >= positional.len() {
                    lines.push(entry(&group.flags_cell(), group.help.as_deref(), column));
                }
            }
        }
    }

    if !optional.is_empty() {
        lines.push(String::new());
        lines.push("optional arguments:".to_string());
        for argument in &optional {
            lines.push(entry(
                &argument.flags_cell(),
                argument.help.as_deref(),
                column,
            ));
        }
    }

    if !inline_group {
        if let Some((group, _)) = subparser {
            lines.push(String::new());
            match &group.title {
                Some(title) => lines.push(format!("{title}:")),
                None => lines.push("subcommands:".to_string()),
            }
            if let Some(description) = &group.description {
                lines.push(format!("  {description}"));
                lines.push(String::new());
            }
            lines.push(entry(&group.flags_cell(), group.help.as_deref(), column));
        }
    }

    if let Some(epilog) = &schema.epilog {
        lines.push(String::new());
        lines.push(epilog.clone());
    }

    lines.join("\n")
}

/// One help entry: the flag cell padded to the column, or the description
/// pushed to a continuation line when the cell overflows.
fn entry(cell: &str, help: Option<&str>, column: usize) -> String {
    let mut line = format!("  {cell}");
    if let Some(help) = help {
        if line.len() + 2 > column {
            line.push('\n');
            line.push_str(&" ".repeat(HELP_COLUMN));
        } else {
            line.push_str(&" ".repeat(column - line.len()));
        }
        line.push_str(help);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Action;
    use crate::parser::schema::ArgumentParser;

    #[test]
    fn usage_empty() {
        let parser = ArgumentParser::new("program");
        assert_eq!(render_usage(&parser, "program"), "usage: program [-h]");
    }

    #[test]
    fn usage_override() {
        let mut parser = ArgumentParser::new("program");
        parser.usage("program --custom");
        assert_eq!(render_usage(&parser, "program"), "usage: program --custom");
    }

    #[test]
    fn usage_interleaves_arguments() {
        let mut parser = ArgumentParser::new("program");
        parser.add_argument("--flag").unwrap();
        parser
            .add_argument("--verbose")
            .unwrap()
            .action(Action::StoreTrue)
            .unwrap();
        parser.add_argument("path").unwrap();
        parser.add_argument("items").unwrap().nargs("*").unwrap();

        assert_eq!(
            render_usage(&parser, "program"),
            "usage: program [-h] [--flag FLAG] [--verbose] path [items ...]"
        );
    }

    #[test]
    fn usage_wraps_at_limit() {
        let mut parser = ArgumentParser::new("program");
        for flag in ["--alpha", "--bravo", "--charlie", "--delta", "--echo"] {
            parser.add_argument(flag).unwrap();
        }

        let expected = format!(
            "usage: program [-h] [--alpha ALPHA] [--bravo BRAVO] [--charlie CHARLIE]\n\
             {:15}[--delta DELTA] [--echo ECHO]",
            ""
        );
        assert_eq!(render_usage(&parser, "program"), expected);
    }

    #[test]
    fn usage_lines_stay_within_limit() {
        let mut parser = ArgumentParser::new("a-program-with-a-rather-long-name");
        for flag in [
            "--alpha", "--bravo", "--charlie", "--delta", "--echo", "--foxtrot", "--golf",
            "--hotel", "--india", "--juliett",
        ] {
            parser.add_argument(flag).unwrap();
        }
        parser.add_argument("paths").unwrap().nargs("+").unwrap();

        let usage = render_usage(&parser, "a-program-with-a-rather-long-name");
        for line in usage.lines() {
            assert!(line.len() <= 80, "line exceeds the budget: '{line}'");
        }
        assert!(usage.lines().count() > 1);
    }

    #[test]
    fn help_empty() {
        let parser = ArgumentParser::new("program");

        assert_eq!(
            render_help(&parser, "program"),
            r#"usage: program [-h]

optional arguments:
  -h, --help  show this help message and exit"#
        );
    }

    #[test]
    fn help_without_auto_option() {
        let mut parser = ArgumentParser::new("program");
        parser.add_help(false);
        assert_eq!(render_help(&parser, "program"), "usage: program");
    }

    #[test]
    fn help_option() {
        let mut parser = ArgumentParser::new("program");
        parser.add_argument("--flag").unwrap().help("message");

        assert_eq!(
            render_help(&parser, "program"),
            r#"usage: program [-h] [--flag FLAG]

optional arguments:
  -h, --help   show this help message and exit
  --flag FLAG  message"#
        );
    }

    #[test]
    fn help_sections() {
        let mut parser = ArgumentParser::new("program");
        parser
            .description("A program.")
            .epilog("See the manual for more.");
        parser.add_argument("name").unwrap().help("name message");

        assert_eq!(
            render_help(&parser, "program"),
            r#"usage: program [-h] name

A program.

positional arguments:
  name        name message

optional arguments:
  -h, --help  show this help message and exit

See the manual for more."#
        );
    }

    #[test]
    fn help_cell_overflow() {
        let mut parser = ArgumentParser::new("program");
        parser
            .add_argument("--a-very-long-option-name")
            .unwrap()
            .help("message");

        let expected = format!(
            "usage: program [-h] [--a-very-long-option-name A-VERY-LONG-OPTION-NAME]\n\
             \noptional arguments:\n\
             \x20 -h, --help{:12}show this help message and exit\n\
             \x20 --a-very-long-option-name A-VERY-LONG-OPTION-NAME\n\
             {:24}message",
            "", ""
        );
        assert_eq!(render_help(&parser, "program"), expected);
    }

    #[test]
    fn help_suppressed_argument_hidden() {
        let mut parser = ArgumentParser::new("program");
        parser.add_argument("--hidden").unwrap().suppress();
        parser.add_argument("--shown").unwrap();

        let help = render_help(&parser, "program");
        assert!(!help.contains("--hidden"));
        assert!(help.contains("--shown"));
    }

    #[test]
    fn help_inline_subparser() {
        let mut parser = ArgumentParser::new("program");
        parser.add_argument("first").unwrap();
        let group = parser.add_subparsers().unwrap();
        group.help("the sub-command to run");
        group.add_parser("read");
        group.add_parser("write");

        assert_eq!(
            render_help(&parser, "program"),
            r#"usage: program [-h] first {read,write} ...

positional arguments:
  first
  {read,write}  the sub-command to run

optional arguments:
  -h, --help    show this help message and exit"#
        );
    }

    #[test]
    fn help_titled_subparser() {
        let mut parser = ArgumentParser::new("program");
        let group = parser.add_subparsers().unwrap();
        group
            .title("commands")
            .description("The available commands.")
            .metavar("COMMAND");
        group.add_parser("read");

        assert_eq!(
            render_help(&parser, "program"),
            r#"usage: program [-h] COMMAND ...

optional arguments:
  -h, --help  show this help message and exit

commands:
  The available commands.

  COMMAND"#
        );
    }
}
