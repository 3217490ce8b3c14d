use std::io::IsTerminal;
use std::path::PathBuf;

use almanac_core::FilterName;
use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: editorial calendar client for admin-ajax endpoints"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; defaults to $ALMANAC_CONFIG, then the user config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the calendar grid.
    Show {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the detail of one item.
    Item { id: u64 },
    /// Move the item at SOURCE_DATE[INDEX] to DESTINATION.
    Move {
        source_date: String,
        index: usize,
        destination: NaiveDate,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Interactive session driven by line commands.
    Shell {
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Any date inside the first week to show.
    #[arg(long = "start")]
    pub start: Option<NaiveDate>,

    #[arg(long = "weeks")]
    pub weeks: Option<String>,

    #[arg(long = "status")]
    pub status: Option<String>,

    #[arg(long = "category")]
    pub category: Option<String>,

    #[arg(long = "tag")]
    pub tag: Option<String>,

    #[arg(long = "author")]
    pub author: Option<String>,

    #[arg(long = "post-type")]
    pub post_type: Option<String>,
}

impl ViewArgs {
    /// Filters given on the command line, in request order.
    pub fn filters(&self) -> Vec<(FilterName, &str)> {
        [
            (FilterName::Status, self.status.as_deref()),
            (FilterName::Category, self.category.as_deref()),
            (FilterName::Tag, self.tag.as_deref()),
            (FilterName::Author, self.author.as_deref()),
            (FilterName::PostType, self.post_type.as_deref()),
            (FilterName::Weeks, self.weeks.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    // stdout carries the rendered calendar
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
