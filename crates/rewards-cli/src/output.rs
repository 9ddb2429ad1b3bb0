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

use std::{fmt::Write, path::PathBuf};

use anyhow::{Context, Result};
use delegation_rewards::{DelegatorRewards, PoolRewardsReport};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Rewards report of the pool recorded in one event log file.
#[derive(Debug, Clone, Serialize)]
pub struct PoolOutput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub report: PoolRewardsReport,
}

#[derive(Tabled)]
struct DelegatorRow {
    delegator: String,
    stake: String,
    pending: String,
    withdrawn: String,
    total: String,
}

impl From<&DelegatorRewards> for DelegatorRow {
    fn from(rewards: &DelegatorRewards) -> Self {
        Self {
            delegator: rewards.delegator.to_string(),
            stake: rewards.stake.to_string(),
            pending: rewards.pending.to_string(),
            withdrawn: rewards.withdrawn.to_string(),
            total: rewards.total.to_string(),
        }
    }
}

pub fn render_table(pools: &[PoolOutput]) -> Result<String> {
    let mut out = String::new();
    for (i, pool) in pools.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let report = &pool.report;
        writeln!(
            out,
            "Pool {} ({} scheme, {} events)",
            pool.path.display(),
            report.scheme,
            report.events
        )?;
        if report.delegators.is_empty() {
            out.push_str("No delegator earned rewards\n");
        } else {
            let rows = report.delegators.iter().map(DelegatorRow::from);
            writeln!(out, "{}", Table::new(rows).with(Style::sharp()))?;
        }
        writeln!(out, "Total stake:         {}", report.total_stake)?;
        writeln!(out, "Block rewards:       {}", report.total_block_rewards)?;
        writeln!(out, "Outstanding rewards: {}", report.outstanding)?;
        writeln!(out, "Undistributed:       {}", report.undistributed())?;
    }
    Ok(out)
}

pub fn render_json(pools: &[PoolOutput]) -> Result<String> {
    serde_json::to_string_pretty(pools).context("Failed to serialize rewards report")
}
