// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command line configuration of `pool-rewards`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use delegation_rewards::Scheme;
use tracing::level_filters::LevelFilter;

/// How the reports are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One table per pool
    #[default]
    Table,
    /// A single JSON document with all pools
    Json,
}

/// Compute the rewards earned by the delegators of one or more staking pools.
///
/// Each file holds the JSON event log of one pool.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct GlobalConfig {
    /// Event log files, one per pool
    #[clap(required = true, value_name = "EVENT_LOG")]
    pub files: Vec<PathBuf>,

    /// Reward distribution scheme (simple, f1)
    #[clap(long, env = "REWARDS_SCHEME", default_value = "simple")]
    pub scheme: Scheme,

    /// Output format
    #[clap(long, env = "REPORT_FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GlobalConfig::try_parse_from(["pool-rewards", "pool.json"]).unwrap();
        assert_eq!(config.files, vec![PathBuf::from("pool.json")]);
        assert_eq!(config.scheme, Scheme::Simple);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.log_level, LevelFilter::INFO);
    }

    #[test]
    fn explicit_flags() {
        let config = GlobalConfig::try_parse_from([
            "pool-rewards",
            "--scheme",
            "f1",
            "--format",
            "json",
            "--log-level",
            "debug",
            "a.json",
            "b.json",
        ])
        .unwrap();
        assert_eq!(config.files.len(), 2);
        assert_eq!(config.scheme, Scheme::F1);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn rejects_unknown_scheme_and_missing_files() {
        assert!(GlobalConfig::try_parse_from(["pool-rewards", "--scheme", "x", "a.json"]).is_err());
        assert!(GlobalConfig::try_parse_from(["pool-rewards"]).is_err());
    }
}
