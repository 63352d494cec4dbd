use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{error, info};
use revplot::plot::{self, PlotRequest};
use revplot::source::GitSource;
use revplot::template::{self, TemplateStore};
use std::collections::HashSet;
use std::{env, fs, process};

/// Template store location, relative to the working directory.
const TEMPLATES_DIR: &str = ".revplot/templates";
const DEFAULT_OUTFILE: &str = "plot.json";

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand)]
enum Command {
    /// Plot a metric file as of the working tree
    Show(ShowArgs),
    /// Compare a metric file across revisions
    Diff(DiffArgs),
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Output file
    #[arg(short, long)]
    out: Option<String>,
    /// Template path or name
    #[arg(short, long)]
    template: Option<String>,
    /// Comma-separated fields to keep, or a '$'-prefixed query path
    #[arg(long)]
    filter: Option<String>,
    /// Print the filled document instead of writing it
    #[arg(long)]
    show_json: bool,
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Metric file to plot
    datafile: Option<String>,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args)]
struct DiffArgs {
    /// Revisions to compare, oldest first
    revisions: Vec<String>,
    /// Metric file to plot
    #[arg(short, long)]
    datafile: Option<String>,
    #[command(flatten)]
    common: CommonArgs,
}

fn to_request(datafile: Option<String>, revisions: Vec<String>, common: &CommonArgs) -> PlotRequest {
    let (fields, query) = match &common.filter {
        Some(filter) if filter.starts_with('$') => (None, Some(filter.clone())),
        Some(filter) => {
            let fields: HashSet<String> = filter
                .split(',')
                .map(|f| f.trim().to_owned())
                .filter(|f| !f.is_empty())
                .collect();
            (Some(fields), None)
        }
        None => (None, None),
    };
    PlotRequest {
        datafile,
        template: common.template.clone(),
        revisions,
        fields,
        query,
    }
}

fn run(args: Args) -> Result<()> {
    let root = env::current_dir()?;
    let source = GitSource::new(&root);
    let store = TemplateStore::new(root.join(TEMPLATES_DIR));

    let (request, common) = match args.command {
        Command::Show(show) => (
            to_request(show.datafile, Vec::new(), &show.common),
            show.common,
        ),
        Command::Diff(diff) => (
            to_request(diff.datafile, diff.revisions, &diff.common),
            diff.common,
        ),
    };

    let filled = plot::plot(&source, &store, &request)?;
    if common.show_json {
        println!("{}", template::dump_string(&filled)?);
        return Ok(());
    }
    let out = common.out.unwrap_or_else(|| DEFAULT_OUTFILE.to_owned());
    let file = fs::File::create(&out)?;
    template::dump(&filled, file)?;
    info!("file://{}", root.join(&out).display());
    Ok(())
}

fn main() {
    let args = Args::parse();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(args.verbose.log_level_filter())
        .init();
    match run(args) {
        Ok(()) => (),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
