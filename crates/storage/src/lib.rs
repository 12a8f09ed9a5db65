// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Persistence for pipelines, runs, and run steps

mod error;
mod state;
mod store;
mod traced;
mod wal;

pub use error::StoreError;
pub use state::MaterializedState;
pub use store::{RunStore, StateStore};
pub use traced::TracedStore;
pub use wal::{Wal, WalError};
