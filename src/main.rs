use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use quire::build::{build_book, collect_items};
use quire::config::Config;
use quire::write::write_index;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so `quire list` can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let project_arg = Arg::with_name("project")
        .index(1)
        .help("Directory containing (or below) quire.yaml [default: .]");

    let matches = App::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .help("Number of derivation workers [default: number of CPUs]"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders every chapter and writes the chapter index")
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("Output directory [default: {project}/_build]"),
                )
                .arg(project_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("Prints the chapter index to stdout")
                .arg(project_arg),
        )
        .get_matches();

    let threads = match matches.value_of("threads") {
        Some(threads) => Some(threads.parse::<usize>().with_context(|| {
            format!("Invalid thread count `{}`", threads)
        })?),
        None => None,
    };

    match matches.subcommand() {
        ("build", Some(sub)) => {
            let config = load_config(sub, threads)?;
            let output = match sub.value_of("output") {
                Some(output) => PathBuf::from(output),
                None => config.project_root.join("_build"),
            };
            build_book(&config, &output).with_context(|| {
                format!("Building into `{}`", output.display())
            })?;
        }
        ("list", Some(sub)) => {
            let config = load_config(sub, threads)?;
            write_index(&collect_items(&config), std::io::stdout().lock())?;
        }
        _ => (),
    }
    Ok(())
}

fn load_config(matches: &ArgMatches, threads: Option<usize>) -> Result<Config> {
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    Config::from_directory(project, threads)
}
