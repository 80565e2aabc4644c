use clap::ArgMatches;
use corte::{InformationLine, LayoutMode, StampRequest, stamp};

use crate::cli::{StampArgs, StampMode};
use crate::shared::{fail, load_config, read_file, write_file};

pub fn run(args: &StampArgs, matches: &ArgMatches) -> Result<(), i32> {
    let config = load_config(args.config.as_deref())?;
    let source = read_file(&args.file)?;

    let lines = ordered_lines(args, matches).map_err(fail)?;

    let mode = match args.mode {
        StampMode::Card => LayoutMode::BorderedCard,
        StampMode::Centered => LayoutMode::CenteredBlock,
    };
    let mut request = StampRequest::new(lines, mode).with_style(config.stamp);
    if let Some(title) = &args.title {
        request = request.with_title(title.clone());
    }

    let stamped = stamp(&source, &request).map_err(fail)?;
    write_file(&args.output, &stamped)
}

/// `--line` and `--text` values merged back into command-line order.
fn ordered_lines(args: &StampArgs, matches: &ArgMatches) -> Result<Vec<InformationLine>, String> {
    let mut placed = Vec::with_capacity(args.lines.len() + args.texts.len());
    let line_at = matches.indices_of("lines").into_iter().flatten();
    for (index, text) in line_at.zip(&args.lines) {
        placed.push((index, parse_line(text)?));
    }
    let text_at = matches.indices_of("texts").into_iter().flatten();
    for (index, text) in text_at.zip(&args.texts) {
        placed.push((index, InformationLine::plain(text.as_str())));
    }
    placed.sort_by_key(|(index, _)| *index);
    Ok(placed.into_iter().map(|(_, line)| line).collect())
}

/// `Label=Value`; the label is everything before the first `=`.
fn parse_line(text: &str) -> Result<InformationLine, String> {
    match text.split_once('=') {
        Some((label, value)) if !label.trim().is_empty() => {
            Ok(InformationLine::label_value(label.trim(), value.trim()))
        }
        _ => Err(format!("expected 'Label=Value', got '{text}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::{CommandFactory, FromArgMatches};

    fn stamp_args(argv: &[&str]) -> (StampArgs, ArgMatches) {
        let matches = Cli::command().try_get_matches_from(argv).unwrap();
        let sub = matches.subcommand_matches("stamp").unwrap().clone();
        (StampArgs::from_arg_matches(&sub).unwrap(), sub)
    }

    #[test]
    fn lines_and_texts_keep_their_order() {
        let (args, matches) = stamp_args(&[
            "corte", "stamp", "in.pdf", "--text", "Atenção", "--line", "Cliente=Maria",
            "--text", "Religação urgente", "--line", "Endereço=Rua das Flores, 12", "-o",
            "out.pdf",
        ]);
        assert_eq!(
            ordered_lines(&args, &matches).unwrap(),
            [
                InformationLine::plain("Atenção"),
                InformationLine::label_value("Cliente", "Maria"),
                InformationLine::plain("Religação urgente"),
                InformationLine::label_value("Endereço", "Rua das Flores, 12"),
            ]
        );
    }

    #[test]
    fn no_lines_is_empty() {
        let (args, matches) = stamp_args(&["corte", "stamp", "in.pdf", "-o", "out.pdf"]);
        assert!(ordered_lines(&args, &matches).unwrap().is_empty());
    }

    #[test]
    fn line_splits_on_first_equals() {
        assert_eq!(
            parse_line("Obs = a=b").unwrap(),
            InformationLine::label_value("Obs", "a=b")
        );
    }

    #[test]
    fn line_without_label_is_rejected() {
        assert!(parse_line("=x").is_err());
        assert!(parse_line("sem rótulo").is_err());
    }
}
