use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vidtrans_engine::ApiFlavor;

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "vidtrans")]
#[command(about = "Submit videos for translation and fetch the results")]
#[command(version)]
pub struct Cli {
    /// RON config file (default: ./vidtrans.ron if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://127.0.0.1:5000
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Backend route family
    #[arg(long, value_enum, global = true)]
    pub api: Option<ApiArg>,

    /// Where log output goes
    #[arg(long, value_enum, global = true)]
    pub log: Option<LogDestination>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a file or URL and follow the task to completion
    Translate(TranslateArgs),
    /// Resume following an existing task
    Watch {
        /// Task id; defaults to the last submitted task
        task_id: Option<String>,
    },
    /// Fetch a finished translation
    Download {
        /// Task id (or video id for the alternate API)
        artifact_id: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List known target languages
    Languages,
}

#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// Local video file to upload
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub file: Option<PathBuf>,

    /// Video URL for the backend to fetch
    #[arg(long)]
    pub url: Option<String>,

    /// Target language code
    #[arg(long)]
    pub lang: Option<String>,

    /// Download the result when the task succeeds
    #[arg(long)]
    pub download: bool,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// CLI spelling of [`ApiFlavor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiArg {
    Primary,
    Alternate,
}

impl From<ApiArg> for ApiFlavor {
    fn from(arg: ApiArg) -> Self {
        match arg {
            ApiArg::Primary => ApiFlavor::Primary,
            ApiArg::Alternate => ApiFlavor::Alternate,
        }
    }
}
