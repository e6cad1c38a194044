use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::client::DEFAULT_PORT;
use crate::error::Result;
use crate::filter::PatternSet;

/// Profile the objects stored in a memcached server
#[derive(Parser, Debug)]
#[command(
    name = "memcached-profile",
    version,
    about,
    disable_help_flag = true,
    override_usage = "memcached-profile -h HOSTNAME [-p PORT] [[-r REGEX] [-r REGEX] ...] [-l NUM_OF_KEYS] [-v]"
)]
pub struct Cli {
    /// Print help (`-h` is taken by --host)
    #[arg(short = '?', long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,

    /// memcached host to connect to
    #[arg(short = 'h', long = "host", value_name = "HOSTNAME")]
    pub host: String,

    #[arg(short, long, value_name = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Limit the number of matching keys to examine. Specify 0 for no limit
    #[arg(short, long, value_name = "NUM_OF_KEYS", default_value_t = 100)]
    pub limit: usize,

    /// Add a regex pattern for filtering keys (repeatable). Default: .*
    #[arg(short = 'r', long = "regex", value_name = "REGEX")]
    pub patterns: Vec<String>,

    /// Be chatty
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Seconds to wait for the TCP connection to be established
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub connect_timeout: u64,
}

/// Validated run configuration. Built once and never modified.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Maximum number of matching keys to collect; 0 means no limit.
    pub limit: usize,
    pub patterns: PatternSet,
    pub verbose: bool,
    pub json: bool,
    pub connect_timeout: Duration,
}

impl Cli {
    /// Compile the patterns and freeze the options into a [`Config`].
    pub fn into_config(self) -> Result<Config> {
        Ok(Config {
            patterns: PatternSet::new(&self.patterns)?,
            host: self.host,
            port: self.port,
            limit: self.limit,
            verbose: self.verbose,
            json: self.json,
            connect_timeout: Duration::from_secs(self.connect_timeout),
        })
    }
}
