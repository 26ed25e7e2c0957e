// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stopper-aware sleeping for runners

use crate::stopper::DaemonStopper;
use std::time::Duration;

/// Sleep up to `delay`, returning early when the stopper is set.
///
/// A `None` or zero delay is equivalent to a single scheduler yield, so a
/// zero-delay retry loop still cannot starve the event loop. Returns whether
/// the stopper was set by the time the sleep ended.
pub async fn sleep_or_wait(delay: Option<Duration>, stopper: &DaemonStopper) -> bool {
    match delay.filter(|d| !d.is_zero()) {
        None => {
            tokio::task::yield_now().await;
            stopper.is_set()
        }
        Some(delay) => stopper.wait_for(delay).await,
    }
}

/// Sleep until the minimum positive delay of a set elapses, or the stopper
/// fires. An empty set (or all-zero delays) is a single yield.
pub async fn sleep_or_wait_any(delays: &[Duration], stopper: &DaemonStopper) -> bool {
    let minimum = delays.iter().filter(|d| !d.is_zero()).min().copied();
    sleep_or_wait(minimum, stopper).await
}

#[cfg(test)]
#[path = "sleeping_tests.rs"]
mod tests;
