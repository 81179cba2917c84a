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

use std::sync::mpsc;
use std::sync::Arc;

use common_exception::ErrorCode;
use common_exception::Result;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use threadpool::ThreadPool;

/// One process-wide pool services every parallel iterator. Tasks are queued
/// once and run to completion on whichever worker picks them up; they do not
/// migrate afterwards.
static GLOBAL_POOL: Lazy<Mutex<ThreadPool>> = Lazy::new(|| {
    Mutex::new(ThreadPool::with_name(
        "strata-worker".to_string(),
        num_cpus::get(),
    ))
});

/// The pool width, which is also the default degree of parallelism.
pub fn pool_size() -> usize {
    GLOBAL_POOL.lock().max_count()
}

/// Runs `f(0..dop)` on the global pool and returns the per-index results in
/// index order. The first error wins; remaining tasks still run to
/// completion before this returns.
pub fn parallel_map<T, F>(dop: usize, f: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(usize) -> Result<T> + Send + Sync + 'static,
{
    if dop == 0 {
        return Ok(vec![]);
    }
    let f = Arc::new(f);
    let (tx, rx) = mpsc::channel::<(usize, Result<T>)>();
    {
        let pool = GLOBAL_POOL.lock();
        for index in 0..dop {
            let f = f.clone();
            let tx = tx.clone();
            pool.execute(move || {
                let result = f(index);
                let _ = tx.send((index, result));
            });
        }
    }
    drop(tx);

    let mut slots: Vec<Option<T>> = (0..dop).map(|_| None).collect();
    let mut first_err: Option<ErrorCode> = None;
    for _ in 0..dop {
        match rx.recv() {
            Ok((index, Ok(v))) => slots[index] = Some(v),
            Ok((_, Err(e))) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
            Err(_) => {
                // A worker died without sending: its closure panicked.
                if first_err.is_none() {
                    first_err = Some(ErrorCode::Internal("worker task panicked".to_string()));
                }
                break;
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }
    slots
        .into_iter()
        .map(|s| s.ok_or_else(|| ErrorCode::Internal("worker task lost".to_string())))
        .collect()
}

pub fn parallel_for<F>(dop: usize, f: F) -> Result<()>
where F: Fn(usize) -> Result<()> + Send + Sync + 'static {
    parallel_map(dop, f).map(|_| ())
}
