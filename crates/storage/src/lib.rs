// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Job store: the durable record that makes interrupted jobs resumable

mod file;
mod memory;
mod policy;
mod record;
mod store;
mod writer;

pub use file::FileJobStore;
pub use memory::MemoryJobStore;
pub use policy::StoreConfig;
pub use record::{JobRecord, CURRENT_RECORD_VERSION};
pub use store::{JobStore, StoreError};
pub use writer::{FsStoreWriter, StoreWriter};
