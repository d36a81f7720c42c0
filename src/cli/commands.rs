use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "aacneo")]
#[command(version, about = "Batch tracking, report import and quality analytics for AAC plants")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new aacneo project in the current directory
    Init,

    /// Create, list and inspect batches
    Batch(BatchCommand),

    /// Record stage data for a batch from a JSON form payload
    Record {
        /// Stage to record
        #[arg(value_enum)]
        stage: RecordStage,

        /// Batch number
        batch: String,

        #[command(flatten)]
        payload: PayloadArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Autoclave cycles
    Autoclave(AutoclaveCommand),

    /// Manually set stage progress flags
    Stage(StageCommand),

    /// Import a plant report workbook (JSON export) into the document store
    Import {
        /// Path to the workbook export
        workbook: PathBuf,

        /// Processing date stamped on imported documents (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Output the upload report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Elapsed time between two times of day, e.g. "11:50 PM" "12:10 AM"
    Duration {
        start: String,
        end: String,
    },

    /// Serve the analytics endpoints over HTTP
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Where a form payload comes from. Without either flag, piped stdin is
/// read.
#[derive(Args, Debug, Clone, Default)]
pub struct PayloadArgs {
    /// Read the payload from a JSON file
    #[arg(long, short = 'f', conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Read the payload from stdin
    #[arg(long)]
    pub stdin: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStage {
    Batching,
    FerryCart,
    TiltingCrane,
    Cutting,
    Segregation,
}

#[derive(Args, Debug)]
pub struct BatchCommand {
    #[command(subcommand)]
    pub action: BatchAction,
}

#[derive(Subcommand, Debug)]
pub enum BatchAction {
    /// Create a new batch
    Create {
        /// Batch number (3-10 characters: A-Z, 0-9, -)
        batch: String,

        /// Mould number (1-10 characters: A-Z, 0-9, -)
        mould: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List batches
    List {
        /// Only batches with this status (in-progress, completed)
        #[arg(long)]
        status: Option<String>,

        /// Only batches whose progress on this stage matches --stage-status
        #[arg(long, requires = "stage_status")]
        stage: Option<String>,

        /// Stage progress to match (pending, in-progress, completed)
        #[arg(long, requires = "stage")]
        stage_status: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one batch
    Show {
        /// Batch number
        batch: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write every batch into the document store
    Export {
        /// Output the upload report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct AutoclaveCommand {
    #[command(subcommand)]
    pub action: AutoclaveAction,
}

#[derive(Subcommand, Debug)]
pub enum AutoclaveAction {
    /// Record an autoclave cycle for the batches it processed
    Record {
        #[command(flatten)]
        payload: PayloadArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recorded autoclave cycles
    List {
        /// Only cycles that processed this batch
        #[arg(long)]
        batch: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct StageCommand {
    #[command(subcommand)]
    pub action: StageAction,
}

#[derive(Subcommand, Debug)]
pub enum StageAction {
    /// Set a stage flag (pending, in-progress, completed)
    Set {
        batch: String,
        stage: String,
        status: String,
    },
}
