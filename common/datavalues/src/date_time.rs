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

use chrono::FixedOffset;
use chrono::TimeZone;

/// A point in time: POSIX seconds plus a display-only timezone offset.
/// Ordering and equality use the seconds field only, so the same instant in
/// two timezones is one value.
#[derive(Clone, Copy, Debug)]
pub struct FlexDateTime {
    pub epoch_sec: i64,
    pub tz_offset_min: i32,
}

impl FlexDateTime {
    pub fn new(epoch_sec: i64, tz_offset_min: i32) -> Self {
        Self {
            epoch_sec,
            tz_offset_min,
        }
    }

    pub fn from_epoch(epoch_sec: i64) -> Self {
        Self::new(epoch_sec, 0)
    }
}

impl PartialEq for FlexDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.epoch_sec == other.epoch_sec
    }
}

impl Eq for FlexDateTime {}

impl PartialOrd for FlexDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FlexDateTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.epoch_sec.cmp(&other.epoch_sec)
    }
}

impl std::fmt::Display for FlexDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match FixedOffset::east_opt(self.tz_offset_min * 60) {
            Some(offset) => match offset.timestamp_opt(self.epoch_sec, 0).single() {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "{}s", self.epoch_sec),
            },
            None => write!(f, "{}s", self.epoch_sec),
        }
    }
}
