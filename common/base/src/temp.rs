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

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use common_exception::Result;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

const TEMP_DIR_PREFIX: &str = "strata_tmp_";

struct TempRegistry {
    process_dir: PathBuf,
    counter: AtomicU64,
    // Files owned by writers that were opened but not yet closed. Dropped
    // writers remove theirs; whatever is left is reclaimed with the process
    // directory.
    live: Mutex<HashSet<PathBuf>>,
}

static REGISTRY: OnceCell<TempRegistry> = OnceCell::new();

/// Installs the temp root. Optional; the first temp allocation falls back to
/// the system temp directory. Calling it twice is a no-op returning the
/// already-installed root.
pub fn init_temp(root: Option<PathBuf>) -> Result<PathBuf> {
    let registry = REGISTRY.get_or_try_init(|| -> Result<TempRegistry> {
        let root = root.unwrap_or_else(std::env::temp_dir);
        collect_orphans(&root);
        let process_dir = root.join(format!("{}{}", TEMP_DIR_PREFIX, std::process::id()));
        std::fs::create_dir_all(&process_dir)?;
        Ok(TempRegistry {
            process_dir,
            counter: AtomicU64::new(0),
            live: Mutex::new(HashSet::new()),
        })
    })?;
    Ok(registry.process_dir.clone())
}

/// A fresh path under the per-process temp directory. Nothing is created.
pub fn new_temp_path(hint: &str) -> Result<PathBuf> {
    let process_dir = init_temp(None)?;
    let registry = REGISTRY.get().unwrap();
    let n = registry.counter.fetch_add(1, Ordering::SeqCst);
    Ok(process_dir.join(format!("{:08}.{}", n, hint)))
}

/// Marks a path as belonging to an unfinished writer.
pub fn register_unfinished(path: &Path) {
    if let Some(registry) = REGISTRY.get() {
        registry.live.lock().insert(path.to_path_buf());
    }
}

/// A closed writer commits its files; they are no longer writer garbage.
pub fn commit_finished(path: &Path) {
    if let Some(registry) = REGISTRY.get() {
        registry.live.lock().remove(path);
    }
}

/// Deletes a registered path, used when a writer is dropped without close.
pub fn discard_unfinished(path: &Path) {
    if let Some(registry) = REGISTRY.get() {
        registry.live.lock().remove(path);
    }
    let _ = std::fs::remove_file(path);
}

/// Removes sibling temp directories whose owning process is gone. Runs once,
/// before the per-process directory is created.
fn collect_orphans(root: &Path) {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let pid = match name.strip_prefix(TEMP_DIR_PREFIX) {
            Some(rest) => match rest.parse::<u32>() {
                Ok(pid) => pid,
                Err(_) => continue,
            },
            None => continue,
        };
        if pid == std::process::id() || process_alive(pid) {
            continue;
        }
        debug!("reclaiming orphaned temp directory {:?}", entry.path());
        if let Err(e) = std::fs::remove_dir_all(entry.path()) {
            warn!("failed to reclaim {:?}: {}", entry.path(), e);
        }
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

// Without a cheap liveness probe we keep the directory; a later process on a
// platform with one will reclaim it.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}
