use std::io::{Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use diffless_store::layout::{hierarchical_chunk_dirs, key_file_path};
use diffless_store::{Addressing, Cache, FileStore, StoreConfig, WriteOptions};
use diffless_types::Digest;

use crate::cli::*;

pub fn run_command(cli: Cli, env: &EnvDefaults) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&cli, env)?;
    tracing::debug!(?config, "resolved store configuration");
    match cli.command {
        Command::Get(args) => cmd_get(&open_cache(&config)?, &args.key),
        Command::Set(args) => cmd_set(&open_cache(&config)?, args),
        Command::Delete(args) => cmd_delete(&open_cache(&config)?, &args.key),
        Command::Clear => cmd_clear(&open_cache(&config)?),
        Command::Path(args) => cmd_path(&config, &args.key),
        Command::Stats => cmd_stats(&open_cache(&config)?),
    }
}

fn open_cache(config: &StoreConfig) -> anyhow::Result<Cache<FileStore>> {
    let store = FileStore::open(config)
        .with_context(|| format!("opening cache at {}", config.cache_path.display()))?;
    Ok(Cache::new(store))
}

/// Build the store configuration.
///
/// Flags win. With `--config`, the file fills the rest and the environment is
/// ignored; without it, the environment fills what the flags leave unset.
fn resolve_config(cli: &Cli, env: &EnvDefaults) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let root = cli
                .root
                .clone()
                .or_else(|| env.root.clone())
                .with_context(|| {
                    format!("no cache root: pass --root, --config, or set {ROOT_ENV}")
                })?;
            let mut config = StoreConfig::new(root);
            config.addressing_delimiter = env.delimiter.clone();
            config
        }
    };
    if let Some(root) = &cli.root {
        config.cache_path = root.clone();
    }
    if let Some(delimiter) = &cli.delimiter {
        config.addressing_delimiter = Some(delimiter.clone());
    }
    Ok(config)
}

fn cmd_get(cache: &Cache<FileStore>, key: &str) -> anyhow::Result<ExitCode> {
    match cache.read_raw(key) {
        Some(bytes) => {
            std::io::stdout().write_all(&bytes)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{} {}", "miss:".yellow(), key);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_set(cache: &Cache<FileStore>, args: SetArgs) -> anyhow::Result<ExitCode> {
    let value = match args.value {
        Some(v) => v.into_bytes(),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).context("reading value from stdin")?;
            buf
        }
    };
    let options = WriteOptions {
        expires_in: args.expires_in.map(Duration::from_secs),
        ..WriteOptions::default()
    };
    if !cache.write_raw(&args.key, &value, &options) {
        bail!("failed to write {}", args.key);
    }
    println!("{} {} ({} bytes)", "✓".green().bold(), args.key, value.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_delete(cache: &Cache<FileStore>, key: &str) -> anyhow::Result<ExitCode> {
    if cache.delete(key) {
        println!("{} Deleted {}", "✓".green().bold(), key.yellow());
    } else {
        println!("Nothing to delete for {}", key.yellow());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_clear(cache: &Cache<FileStore>) -> anyhow::Result<ExitCode> {
    cache.clear();
    println!(
        "{} Cleared {}",
        "✓".green().bold(),
        cache.backend().root().display()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_path(config: &StoreConfig, key: &str) -> anyhow::Result<ExitCode> {
    let root = &config.cache_path;
    let addressing = config.addressing()?;
    match &addressing {
        Addressing::Flat => println!("key:   {}", key_file_path(root, key).display()),
        Addressing::Hierarchical { delimiter } => {
            for (dir, segment) in hierarchical_chunk_dirs(root, key, delimiter) {
                println!(
                    "{} {:?} -> {}",
                    Digest::of(segment).short_hex().dimmed(),
                    segment,
                    dir.display()
                );
            }
        }
    }
    println!("value: {}", addressing.value_path(root, key).display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_stats(cache: &Cache<FileStore>) -> anyhow::Result<ExitCode> {
    let store = cache.backend();
    let stats = store.stats()?;
    let mode = match store.addressing() {
        Addressing::Flat => "flat".to_string(),
        Addressing::Hierarchical { delimiter } => format!("hierarchical ({delimiter:?})"),
    };
    println!("Root: {}", store.root().display().to_string().bold());
    println!("Addressing: {}", mode.cyan());
    println!("Entries: {}", stats.entries.to_string().bold());
    println!("Files: {}  Directories: {}", stats.files, stats.directories);
    println!("Bytes: {}", stats.bytes);
    Ok(ExitCode::SUCCESS)
}
