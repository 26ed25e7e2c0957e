// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! okra-core: leaf types shared across the okra operator framework

pub mod clock;
pub mod duration;
pub mod id;
pub mod memo;
pub mod patch;
pub mod resource;

pub use clock::{Clock, FakeClock, SystemClock};
pub use duration::{parse_duration, DurationError};
pub use id::DaemonId;
pub use memo::Memo;
pub use patch::Patch;
pub use resource::{Body, ResourceRef};
