use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ligolwctl::cmd_list;
use ligolwctl::cmd_print;
use ligolwctl::cmd_select;
use ligolwctl::common::{self, Selector};

#[derive(Parser, Debug)]
#[command(name = "ligolwctl", version, about = "LIGO Light Weight XML CLI")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse a document and write it back out
    Print {
        path: PathBuf,
        /// Reference an XSL stylesheet after the header
        #[arg(long)]
        xsl: Option<String>,
        /// Indent with this many spaces instead of a tab
        #[arg(long)]
        spaces: Option<usize>,
    },
    /// List tables and arrays
    List { path: PathBuf },
    /// Keep only the selected elements
    Extract {
        path: PathBuf,
        #[arg(long, default_value = "Table")]
        tag: String,
        /// Match the Name attribute (":table"/":array" suffix optional)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        xsl: Option<String>,
    },
    /// Drop the selected elements
    Strip {
        path: PathBuf,
        #[arg(long, default_value = "Table")]
        tag: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        xsl: Option<String>,
    },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Print { path, xsl, spaces } => cmd_print::run(&path, xsl, spaces)?,
        Cmd::List { path } => cmd_list::run(&path, json)?,
        Cmd::Extract {
            path,
            tag,
            name,
            xsl,
        } => {
            let selector = Selector::new(tag, name);
            cmd_select::extract(&path, &selector, &common::write_options(xsl, None))?
        }
        Cmd::Strip {
            path,
            tag,
            name,
            xsl,
        } => {
            let selector = Selector::new(tag, name);
            cmd_select::strip(&path, &selector, &common::write_options(xsl, None))?
        }
    };

    Ok(())
}
