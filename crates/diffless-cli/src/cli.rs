use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "diffless",
    about = "Byte-stable file cache for entries committed to version control",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Cache root directory [env: DIFFLESS_ROOT, unless --config is given]
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Split keys on this delimiter (hierarchical addressing)
    /// [env: DIFFLESS_DELIMITER, unless --config is given]
    #[arg(long, global = true)]
    pub delimiter: Option<String>,

    /// TOML file with `cache_path` and optional `addressing_delimiter`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the stored value for a key
    Get(KeyArgs),
    /// Store a value (from the argument or stdin)
    Set(SetArgs),
    /// Delete a key
    Delete(KeyArgs),
    /// Remove every entry under the root
    Clear,
    /// Show where a key lives on disk without touching it
    Path(KeyArgs),
    /// Count files and bytes under the root
    Stats,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    pub value: Option<String>,
    /// Accepted for compatibility; entries never expire
    #[arg(long, value_name = "SECS")]
    pub expires_in: Option<u64>,
}

pub const ROOT_ENV: &str = "DIFFLESS_ROOT";
pub const DELIMITER_ENV: &str = "DIFFLESS_DELIMITER";

/// Fallbacks read from the environment.
///
/// Only consulted when no `--config` file is given, so a stray variable can
/// never change the root or addressing of a configured cache.
#[derive(Clone, Debug, Default)]
pub struct EnvDefaults {
    pub root: Option<PathBuf>,
    pub delimiter: Option<String>,
}

impl EnvDefaults {
    pub fn from_process() -> Self {
        Self {
            root: std::env::var_os(ROOT_ENV).map(PathBuf::from),
            delimiter: std::env::var(DELIMITER_ENV).ok(),
        }
    }
}
