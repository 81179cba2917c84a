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

use std::path::PathBuf;

use common_exception::ErrorCode;
use common_exception::Result;
use once_cell::sync::OnceCell;

/// Engine knobs. Installed once per process; readers get the installed
/// config or the defaults.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bytes pulled from a CSV input per parse round.
    pub csv_read_buffer_size: usize,
    /// Rows moved per cursor read in scans and shuffles.
    pub read_batch_size: usize,
    /// Segments for newly materialized columns and frames; 0 means the
    /// worker-pool width.
    pub default_segment_count: usize,
    /// Advisory cap on the bytes a sort partition may occupy in memory.
    pub sort_buffer_size: usize,
    /// Root for per-process temp directories; empty means the system temp.
    pub temp_root: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            csv_read_buffer_size: 8 * 1024 * 1024,
            read_batch_size: 65536,
            default_segment_count: 0,
            sort_buffer_size: 256 * 1024 * 1024,
            temp_root: String::new(),
        }
    }
}

impl EngineConfig {
    /// Environment overrides in the `STRATA_<FIELD>` convention.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("STRATA_CSV_READ_BUFFER_SIZE") {
            if let Ok(v) = v.parse() {
                config.csv_read_buffer_size = v;
            }
        }
        if let Ok(v) = std::env::var("STRATA_READ_BATCH_SIZE") {
            if let Ok(v) = v.parse() {
                config.read_batch_size = v;
            }
        }
        if let Ok(v) = std::env::var("STRATA_DEFAULT_SEGMENT_COUNT") {
            if let Ok(v) = v.parse() {
                config.default_segment_count = v;
            }
        }
        if let Ok(v) = std::env::var("STRATA_SORT_BUFFER_SIZE") {
            if let Ok(v) = v.parse() {
                config.sort_buffer_size = v;
            }
        }
        if let Ok(v) = std::env::var("STRATA_TEMP_ROOT") {
            config.temp_root = v;
        }
        config
    }

    pub fn default_segments(&self) -> usize {
        if self.default_segment_count > 0 {
            self.default_segment_count
        } else {
            common_base::runtime::pool_size()
        }
    }
}

static CONFIG: OnceCell<EngineConfig> = OnceCell::new();

/// Installs the process-wide config. Fails if something already read the
/// defaults or installed one.
pub fn init_config(config: EngineConfig) -> Result<()> {
    let temp_root = if config.temp_root.is_empty() {
        None
    } else {
        Some(PathBuf::from(&config.temp_root))
    };
    common_base::temp::init_temp(temp_root)?;
    CONFIG
        .set(config)
        .map_err(|_| ErrorCode::InvalidState("engine config is already installed".to_string()))
}

pub fn config() -> &'static EngineConfig {
    CONFIG.get_or_init(EngineConfig::default)
}
