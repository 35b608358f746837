// Copyright 2026 BadCompany
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

//! Correlation id sources for requests the relay originates itself.

use std::sync::atomic::{AtomicI64, Ordering};

use uuid::Uuid;

use crate::models::RequestId;

pub trait IdSource: Send + Sync {
    /// Produce an id not handed out before by this source.
    fn next_id(&self) -> RequestId;
}

/// Random v4 UUID ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&self) -> RequestId {
        RequestId::Str(Uuid::new_v4().to_string())
    }
}

/// Monotonic integer ids, for deterministic hosts
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicI64,
}

impl SequentialIds {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> RequestId {
        RequestId::Num(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
