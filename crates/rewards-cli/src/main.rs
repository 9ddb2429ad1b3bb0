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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use delegation_rewards::{compute_pool_report, load_event_log, Scheme};
use futures_util::future::try_join_all;

mod config;
mod output;

use config::{GlobalConfig, OutputFormat};
use output::{render_json, render_table, PoolOutput};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GlobalConfig::parse();

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let pools = run(&config).await?;
    let rendered = match config.format {
        OutputFormat::Table => render_table(&pools)?,
        OutputFormat::Json => render_json(&pools)?,
    };
    println!("{rendered}");

    Ok(())
}

/// Compute the report of every pool, each on its own blocking task.
async fn run(config: &GlobalConfig) -> Result<Vec<PoolOutput>> {
    tracing::info!(pools = config.files.len(), scheme = %config.scheme, "computing pool rewards");

    let tasks = config.files.iter().cloned().map(|path| {
        let scheme = config.scheme;
        tokio::task::spawn_blocking(move || pool_rewards(path, scheme))
    });

    try_join_all(tasks)
        .await
        .context("Pool rewards task failed")?
        .into_iter()
        .collect()
}

fn pool_rewards(path: PathBuf, scheme: Scheme) -> Result<PoolOutput> {
    let events = load_event_log(&path)?;
    let report = compute_pool_report(scheme, &events)
        .with_context(|| format!("Failed to compute rewards for {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        delegators = report.delegators.len(),
        outstanding = %report.outstanding,
        "computed pool rewards"
    );
    Ok(PoolOutput { path, report })
}
