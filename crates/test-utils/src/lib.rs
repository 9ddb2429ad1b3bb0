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

//! Test utilities for the delegation rewards crates.
//!
//! This crate provides deterministic delegator identities, a builder for well-ordered event logs,
//! and proptest strategies producing valid logs.

pub mod arbitrary;
pub mod builder;

use std::path::PathBuf;

use alloy_primitives::{B256, I256};
use delegation_rewards::{log::to_json, DelegatorId, Event};
use tempfile::TempDir;

pub use builder::EventLogBuilder;

/// Identity `n`, encoded big-endian and left-padded to 32 bytes.
pub fn delegator(n: u64) -> DelegatorId {
    B256::left_padding_from(&n.to_be_bytes())
}

/// Signed event amount from a plain integer.
pub fn amount(n: i64) -> I256 {
    I256::try_from(n).expect("every i64 fits in an I256")
}

/// Write `events` as a JSON log file named `name` inside `dir`.
pub fn write_event_log(dir: &TempDir, name: &str, events: &[Event]) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, to_json(events)?)?;
    Ok(path)
}
