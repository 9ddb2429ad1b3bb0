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

use alloy_primitives::B256;

/// Observer of changes to a registered staker.
pub trait StakerRegistryListener: Send {
    /// The signing address of `staker` changed.
    fn on_signing_address_change(&mut self, staker: B256, new_signing_address: B256);

    /// The coinbase address of `staker` changed.
    fn on_coinbase_address_change(&mut self, staker: B256, new_coinbase_address: B256);

    /// This listener was registered for `staker`.
    fn on_listener_added(&mut self, _staker: B256) {}

    /// This listener was removed from `staker`.
    fn on_listener_removed(&mut self, _staker: B256) {}
}

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);
