use std::fs;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

fn default_host() -> String {
    String::from("localhost")
}

const fn default_port() -> u16 {
    8000
}

#[derive(Args, Deserialize, Clone, Debug)]
pub struct Config {
    #[arg(long, env = "PROJECT_TRACKING_HOST", default_value_t = default_host())]
    #[serde(default = "default_host")]
    host: String,
    #[arg(long, env = "PROJECT_TRACKING_PORT", default_value_t = default_port())]
    #[serde(default = "default_port")]
    port: u16,
    /// SQLite database file. Without it the store lives in memory.
    #[arg(long, env = "PROJECT_TRACKING_DB_PATH")]
    #[serde(default)]
    db_path: Option<Utf8PathBuf>,
    /// Leave specimens without both a tumour and a normal sample out of pair
    /// files.
    #[arg(long, env = "PROJECT_TRACKING_PAIR_FILE_COMPLETE_ONLY", default_value_t)]
    #[serde(default)]
    pair_file_complete_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: None,
            pair_file_complete_only: false,
        }
    }
}

impl Config {
    #[must_use]
    pub fn dev(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            ..Default::default()
        }
    }

    /// # Errors
    pub fn from_toml(path: &Utf8Path) -> anyhow::Result<Self> {
        let contents =
            fs::read_to_string(path).context(format!("failed to read config file {path}"))?;

        toml::from_str(&contents).context(format!("failed to parse config file {path}"))
    }

    #[must_use]
    pub fn app_address(&self) -> String {
        let Self { host, port, .. } = self;

        format!("{host}:{port}")
    }

    #[must_use]
    pub fn db_path(&self) -> Option<&Utf8Path> {
        self.db_path.as_deref()
    }

    #[must_use]
    pub fn pair_file_complete_only(&self) -> bool {
        self.pair_file_complete_only
    }
}

#[derive(Parser)]
#[command(version, about = "Lab-tracking backend for genomic sequencing pipelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve an in-memory store with human-readable logs.
    Dev {
        #[arg(long, default_value_t = default_host())]
        host: String,
        #[arg(long, default_value_t = default_port())]
        port: u16,
    },
    /// Serve with the given configuration and daily-rolled JSON logs.
    Prod {
        #[command(flatten)]
        config: Config,
        /// A TOML file that replaces the command-line configuration.
        #[arg(long, env = "PROJECT_TRACKING_CONFIG_PATH")]
        config_path: Option<Utf8PathBuf>,
        #[arg(long, env = "PROJECT_TRACKING_LOG_DIR")]
        log_dir: Option<Utf8PathBuf>,
    },
}
