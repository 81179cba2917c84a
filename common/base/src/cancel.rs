// Copyright 2022 Strata Authors.
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

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use common_exception::ErrorCode;
use common_exception::Result;

// Command ids start at 1; CANCELLED_AT == 0 means "no cancellation pending".
// A cancellation only ever names the command that was current when it was
// requested, so a later command is unaffected.
static COMMAND_ID: AtomicU64 = AtomicU64::new(1);
static CANCELLED_AT: AtomicU64 = AtomicU64::new(0);

/// Marks the start of a new top-level command, voiding any stale
/// cancellation request. Returns the new command id.
pub fn begin_command() -> u64 {
    COMMAND_ID.fetch_add(1, Ordering::SeqCst) + 1
}

pub fn current_command_id() -> u64 {
    COMMAND_ID.load(Ordering::SeqCst)
}

/// Requests cancellation of the currently running command. Callable from any
/// thread.
pub fn cancel() {
    CANCELLED_AT.store(COMMAND_ID.load(Ordering::SeqCst), Ordering::SeqCst);
}

pub fn is_cancelled() -> bool {
    CANCELLED_AT.load(Ordering::SeqCst) == COMMAND_ID.load(Ordering::SeqCst)
}

/// Polled at every cursor read boundary and at CSV file boundaries.
pub fn check_cancelled() -> Result<()> {
    if is_cancelled() {
        return Err(ErrorCode::Cancelled("operation cancelled".to_string()));
    }
    Ok(())
}
