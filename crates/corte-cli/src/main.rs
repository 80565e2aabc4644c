mod cli;
mod import_cmd;
mod page_range;
mod report_cmd;
mod runs_cmd;
mod shared;
mod stamp_cmd;

use clap::{CommandFactory, FromArgMatches};
use cli::Cli;

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    shared::init_tracing(cli.verbose);

    let result = match cli.command {
        cli::Commands::Import(ref args) => import_cmd::run(args),
        cli::Commands::Stamp(ref args) => match matches.subcommand_matches("stamp") {
            Some(sub) => stamp_cmd::run(args, sub),
            None => Err(1),
        },
        cli::Commands::Report(ref args) => report_cmd::run(args),
        cli::Commands::Runs {
            ref file,
            ref pages,
            scale,
            cut_ratio,
            format,
        } => runs_cmd::run(file, pages.as_deref(), scale, cut_ratio, format),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
