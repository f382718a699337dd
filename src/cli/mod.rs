//! Command-line interface definitions for the `vpc-eip` binary.

mod input;

use camino::Utf8PathBuf;
use clap::{Args, Parser};

pub(crate) use input::{InputError, read_resource};

/// Top-level CLI for the `vpc-eip` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vpc-eip",
    about = "Manage VPC elastic IPs through their create/read/update/delete lifecycle",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Allocate an elastic IP and wait until it is usable.
    #[command(name = "create")]
    Create(ResourceArgs),
    /// Print the current state of an elastic IP, or `null` when it is gone.
    #[command(name = "read")]
    Read(IdArgs),
    /// Apply bandwidth and port changes to an existing elastic IP.
    #[command(name = "update")]
    Update(UpdateArgs),
    /// Release an elastic IP and wait until it is gone.
    #[command(name = "delete")]
    Delete(IdArgs),
    /// Print the state of an existing elastic IP for adoption.
    #[command(name = "import")]
    Import(IdArgs),
}

/// Arguments naming the desired configuration.
#[derive(Debug, Args)]
pub(crate) struct ResourceArgs {
    /// JSON file holding the `publicip`, `bandwidth` and `value_specs` blocks.
    #[arg(long, value_name = "PATH")]
    pub(crate) resource: Utf8PathBuf,
}

/// Arguments naming an existing elastic IP.
#[derive(Debug, Args)]
pub(crate) struct IdArgs {
    /// Provider-assigned identifier.
    #[arg(long)]
    pub(crate) id: String,
    /// Region override for this call.
    #[arg(long)]
    pub(crate) region: Option<String>,
}

/// Arguments for the `update` subcommand.
#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    /// Provider-assigned identifier.
    #[arg(long)]
    pub(crate) id: String,
    /// JSON file holding the desired configuration.
    #[arg(long, value_name = "PATH")]
    pub(crate) resource: Utf8PathBuf,
}
