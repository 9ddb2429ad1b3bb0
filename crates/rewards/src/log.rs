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

//! JSON representation of a pool event log.

use std::{fs, path::Path};

use alloy_primitives::I256;
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    error::{InputError, RewardsError},
    event::{DelegatorId, Event},
};

/// Amount as it appears in a log file: a JSON number or a decimal string for values beyond 64
/// bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Int(serde_json::Number),
    Text(String),
}

/// One record of a log file. The kind is kept as a plain string until conversion, so unknown
/// kinds are reported as invalid input at their index instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: String,
    #[serde(default)]
    pub source: Option<DelegatorId>,
    pub block_number: u64,
    #[serde(default)]
    pub amount: Option<RawAmount>,
}

impl EventRecord {
    fn to_event(&self) -> Result<Event, InputError> {
        let kind = self.kind.parse()?;
        let amount = match &self.amount {
            None => None,
            // Integers outside the u64/i64 range and fractions arrive as floats and are rejected.
            Some(RawAmount::Int(n)) => {
                let text = n.to_string();
                Some(I256::from_dec_str(&text).map_err(|_| InputError::UnrecognizedAmount(text))?)
            }
            Some(RawAmount::Text(s)) => Some(
                I256::from_dec_str(s.trim())
                    .map_err(|_| InputError::UnrecognizedAmount(s.clone()))?,
            ),
        };
        Ok(Event::new(kind, self.source, self.block_number, amount))
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            kind: event.kind.as_str().to_string(),
            source: event.source,
            block_number: event.block_number,
            amount: event.amount.map(|amount| RawAmount::Text(amount.to_string())),
        }
    }
}

/// Convert parsed records into events, failing with the index of the first bad record.
pub fn events_from_records(records: &[EventRecord]) -> Result<Vec<Event>, RewardsError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| record.to_event().map_err(|reason| RewardsError::input(index, reason)))
        .collect()
}

/// Parse a JSON array of [EventRecord]s.
pub fn parse_event_log(json: &str) -> anyhow::Result<Vec<Event>> {
    let records: Vec<EventRecord> =
        serde_json::from_str(json).context("Failed to parse event log JSON")?;
    Ok(events_from_records(&records)?)
}

/// Read and parse an event log file.
pub fn load_event_log(path: impl AsRef<Path>) -> anyhow::Result<Vec<Event>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log {}", path.display()))?;
    let events =
        parse_event_log(&json).with_context(|| format!("Invalid event log {}", path.display()))?;
    tracing::debug!(path = %path.display(), events = events.len(), "loaded event log");
    Ok(events)
}

/// Serialize events to the JSON log format.
pub fn to_json(events: &[Event]) -> anyhow::Result<String> {
    let records: Vec<EventRecord> = events.iter().map(EventRecord::from).collect();
    serde_json::to_string_pretty(&records).context("Failed to serialize event log")
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;
    use crate::event::EventKind;

    const D1: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn parses_integer_and_string_amounts() {
        let json = format!(
            r#"[
                {{ "kind": "VOTE", "source": "{D1}", "block_number": 3001, "amount": 2 }},
                {{ "kind": "BLOCK", "block_number": 3002, "amount": "5000" }},
                {{ "kind": "WITHDRAW", "source": "{D1}", "block_number": 3003, "amount": null }}
            ]"#
        );
        let events = parse_event_log(&json).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], Event::vote(B256::with_last_byte(1), 3001, I256::try_from(2).unwrap()));
        assert_eq!(events[1].kind, EventKind::Block);
        assert_eq!(events[1].source, None);
        assert_eq!(events[1].amount, Some(I256::try_from(5000).unwrap()));
        assert_eq!(events[2].amount, None);
    }

    #[test]
    fn integer_amounts_beyond_i64_are_accepted() {
        let json = format!(
            r#"[{{ "kind": "VOTE", "source": "{D1}", "block_number": 1, "amount": 10000000000000000000 }}]"#
        );
        let events = parse_event_log(&json).unwrap();
        assert_eq!(events[0].amount, Some(I256::from_dec_str("10000000000000000000").unwrap()));
    }

    #[test]
    fn unrepresentable_numbers_are_invalid_input_at_their_index() {
        let json = format!(
            r#"[
                {{ "kind": "VOTE", "source": "{D1}", "block_number": 1, "amount": 2 }},
                {{ "kind": "VOTE", "source": "{D1}", "block_number": 1, "amount": 1.5 }}
            ]"#
        );
        let err = parse_event_log(&json).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RewardsError>(),
            Some(&RewardsError::input(1, InputError::UnrecognizedAmount("1.5".into())))
        );
    }

    #[test]
    fn negative_amounts_survive_parsing() {
        let json = format!(r#"[{{ "kind": "VOTE", "source": "{D1}", "block_number": 1, "amount": -3 }}]"#);
        let events = parse_event_log(&json).unwrap();
        assert!(events[0].amount.unwrap().is_negative());
    }

    #[test]
    fn unknown_kind_is_invalid_input_at_its_index() {
        let records = vec![
            EventRecord {
                kind: "VOTE".into(),
                source: Some(B256::with_last_byte(1)),
                block_number: 1,
                amount: Some(RawAmount::Int(1u64.into())),
            },
            EventRecord {
                kind: "SLASH".into(),
                source: None,
                block_number: 2,
                amount: None,
            },
        ];
        assert_eq!(
            events_from_records(&records),
            Err(RewardsError::input(1, InputError::UnrecognizedKind("SLASH".into())))
        );
    }

    #[test]
    fn round_trips_through_a_file() {
        let events = vec![
            Event::vote(B256::with_last_byte(7), 1, I256::try_from(10).unwrap()),
            Event::block(Some(B256::with_last_byte(9)), 2, I256::try_from(500).unwrap()),
            Event::withdraw(B256::with_last_byte(7), 3),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");
        std::fs::write(&path, to_json(&events).unwrap()).unwrap();

        assert_eq!(load_event_log(&path).unwrap(), events);
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        assert!(parse_event_log("{ not json").is_err());
    }
}
