use argot::{Action, ArgumentParser, Error, Kind};

#[test]
fn switch_and_positional() {
    let mut parser = ArgumentParser::new("program");
    parser
        .add_argument("--verbose")
        .unwrap()
        .action(Action::StoreTrue)
        .unwrap();
    parser.add_argument("path").unwrap();

    let namespace = parser.parse_args_from(["--verbose", "file.txt"]).unwrap();

    assert_eq!(namespace.values("verbose").unwrap(), ["1"]);
    assert_eq!(namespace.to_string("verbose").unwrap(), "true");
    assert_eq!(namespace.values("path").unwrap(), ["file.txt"]);
}

#[test]
fn append_across_specifications() {
    let mut parser = ArgumentParser::new("program");
    parser
        .add_argument(["-n", "--number"])
        .unwrap()
        .nargs("+")
        .unwrap()
        .action(Action::Append)
        .unwrap();

    let namespace = parser.parse_args_from(["-n", "1", "2", "-n", "3"]).unwrap();

    assert_eq!(namespace.values("number").unwrap(), ["1", "2", "3"]);
    assert_eq!(namespace.to_string("number").unwrap(), "[1, 2, 3]");
}

#[test]
fn invalid_choice_message() {
    let mut parser = ArgumentParser::new("program");
    parser.exit_on_error(false);
    parser
        .add_argument("--level")
        .unwrap()
        .choices(["low", "med", "high"])
        .unwrap();

    let error = parser.parse_args_from(["--level", "mid"]).unwrap_err();

    assert_eq!(
        error,
        Error::Parse(
            "argument --level: invalid choice: 'mid' (choose from 'low', 'med', 'high')"
                .to_string()
        )
    );
}

#[test]
fn interior_star_partitioning() {
    let mut parser = ArgumentParser::new("program");
    parser.add_argument("a").unwrap();
    parser.add_argument("b").unwrap().nargs("*").unwrap();
    parser.add_argument("c").unwrap();

    let namespace = parser.parse_args_from(["1", "2", "3", "4"]).unwrap();

    assert_eq!(namespace.values("a").unwrap(), ["1"]);
    assert_eq!(namespace.values("b").unwrap(), ["2", "3"]);
    assert_eq!(namespace.values("c").unwrap(), ["4"]);
}

#[test]
fn bundled_short_flags() {
    let mut parser = ArgumentParser::new("program");
    for flag in ["-a", "-b", "-c"] {
        parser
            .add_argument(flag)
            .unwrap()
            .action(Action::StoreTrue)
            .unwrap();
    }

    let namespace = parser.parse_args_from(["-abc"]).unwrap();

    for key in ["a", "b", "c"] {
        assert_eq!(namespace.values(key).unwrap(), ["1"]);
    }
}

#[test]
fn abbreviation_policy() {
    let mut parser = ArgumentParser::new("program");
    parser.add_argument("--foo").unwrap();

    let namespace = parser.parse_args_from(["--fo", "bar"]).unwrap();
    assert_eq!(namespace.values("foo").unwrap(), ["bar"]);

    let mut strict = ArgumentParser::new("program");
    strict.exit_on_error(false).allow_abbrev(false);
    strict.add_argument("--foo").unwrap();

    let error = strict.parse_args_from(["--fo", "bar"]).unwrap_err();
    assert_eq!(
        error,
        Error::Parse("unrecognized arguments: --fo bar".to_string())
    );
}

#[test]
fn zero_or_one_with_const_and_default() {
    let mut parser = ArgumentParser::new("program");
    parser
        .add_argument("-x")
        .unwrap()
        .nargs("?")
        .unwrap()
        .const_value("C")
        .unwrap()
        .default_value("D");

    let empty = parser.parse_args_from(Vec::<String>::new()).unwrap();
    assert_eq!(empty.values("x").unwrap(), ["D"]);

    let bare = parser.parse_args_from(["-x"]).unwrap();
    assert_eq!(bare.values("x").unwrap(), ["C"]);

    let given = parser.parse_args_from(["-x", "V"]).unwrap();
    assert_eq!(given.values("x").unwrap(), ["V"]);
}

#[test]
fn repeated_parses_are_independent() {
    let mut parser = ArgumentParser::new("program");
    parser.add_argument("--value").unwrap();

    let first = parser.parse_args_from(["--value", "1"]).unwrap();
    let second = parser.parse_args_from(["--value", "2"]).unwrap();

    assert_eq!(first.values("value").unwrap(), ["1"]);
    assert_eq!(second.values("value").unwrap(), ["2"]);
}

#[test]
fn parents_contribute_arguments() {
    let mut base = ArgumentParser::new("base");
    base.add_help(false);
    base.add_argument("--config").unwrap();

    let mut parser = ArgumentParser::new("program");
    parser.parents(vec![base]);
    parser.add_argument("path").unwrap();

    let namespace = parser
        .parse_args_from(["--config", "a.toml", "file.txt"])
        .unwrap();

    assert_eq!(namespace.values("config").unwrap(), ["a.toml"]);
    assert_eq!(namespace.values("path").unwrap(), ["file.txt"]);
}

#[test]
fn sub_commands_route_remaining_tokens() {
    let mut parser = ArgumentParser::new("vcs");
    parser
        .add_argument("--verbose")
        .unwrap()
        .action(Action::StoreTrue)
        .unwrap();
    let commands = parser.add_subparsers().unwrap();
    commands.dest("command");
    let commit = commands.add_parser("commit");
    commit.add_argument(["-m", "--message"]).unwrap();
    commands.add_parser("push");

    let namespace = parser
        .parse_args_from(["--verbose", "commit", "-m", "fix"])
        .unwrap();

    assert_eq!(namespace.values("verbose").unwrap(), ["1"]);
    assert_eq!(namespace.values("command").unwrap(), ["commit"]);
    assert_eq!(namespace.values("message").unwrap(), ["fix"]);
}

#[test]
fn sub_command_invalid_choice() {
    let mut parser = ArgumentParser::new("vcs");
    parser.exit_on_error(false);
    let commands = parser.add_subparsers().unwrap();
    commands.add_parser("commit");
    commands.add_parser("push");

    let error = parser.parse_args_from(["rebase"]).unwrap_err();

    assert_eq!(
        error,
        Error::Parse(
            "argument {commit,push}: invalid choice: 'rebase' (choose from 'commit', 'push')"
                .to_string()
        )
    );
}

#[test]
fn required_arguments_are_enforced() {
    let mut parser = ArgumentParser::new("program");
    parser.exit_on_error(false);
    parser.add_argument("path").unwrap();
    parser
        .add_argument(["-o", "--output"])
        .unwrap()
        .required(true)
        .unwrap();

    let error = parser.parse_args_from(Vec::<String>::new()).unwrap_err();

    assert_eq!(
        error,
        Error::Parse("the following arguments are required: path, -o/--output".to_string())
    );
}

#[test]
fn declaration_errors_propagate() {
    let mut parser = ArgumentParser::new("program");

    let error = parser.add_argument(["path", "other"]).unwrap_err();
    assert!(matches!(error, Error::Value(_)));

    let argument = parser.add_argument("path").unwrap();
    assert_eq!(argument.kind(), Kind::Positional);
    assert!(matches!(argument.required(true), Err(Error::Type(_))));
}

#[test]
fn usage_and_help_are_formatted() {
    let mut parser = ArgumentParser::new("program");
    parser.description("Does a thing.");
    parser.add_argument("--flag").unwrap().help("a flag");
    parser.add_argument("path").unwrap();

    assert_eq!(
        parser.format_usage(),
        "usage: program [-h] [--flag FLAG] path"
    );

    let help = parser.format_help();
    assert!(help.contains("Does a thing."));
    assert!(help.contains("positional arguments:"));
    assert!(help.contains("optional arguments:"));
    assert!(help.contains("-h, --help"));
    for line in help.lines() {
        assert!(line.len() <= 80);
    }
}

#[test]
fn namespace_rendering() {
    let mut parser = ArgumentParser::new("program");
    parser
        .add_argument("-v")
        .unwrap()
        .action(Action::Count)
        .unwrap();
    parser.add_argument("--items").unwrap().nargs("*").unwrap();

    let namespace = parser
        .parse_args_from(["-v", "-v", "--items", "a", "b"])
        .unwrap();

    assert_eq!(namespace.to_string("v").unwrap(), "2");
    assert_eq!(namespace.to_string("items").unwrap(), "[a, b]");
    assert_eq!(namespace.action("items").unwrap(), Action::Store);
    assert!(!namespace.exists("missing"));
}

#[test]
fn get_default_reads_the_schema() {
    let mut parser = ArgumentParser::new("program");
    parser.argument_default("fallback");
    parser.add_argument("--value").unwrap().default_value("7");
    parser.add_argument("--other").unwrap();

    assert_eq!(parser.get_default("value").as_deref(), Some("7"));
    assert_eq!(parser.get_default("other").as_deref(), Some("fallback"));
    assert_eq!(parser.get_default("missing"), None);
}

#[test]
fn nargs_validation_is_immediate() {
    let mut parser = ArgumentParser::new("program");
    let argument = parser.add_argument("--items").unwrap();

    assert!(matches!(argument.nargs("x"), Err(Error::Value(_))));
    argument.nargs("+").unwrap();
    assert_eq!(
        parser.format_usage(),
        "usage: program [-h] [--items ITEMS [ITEMS ...]]"
    );
}
