// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Store module - target service backends.

pub mod docker;
pub mod mock;
mod traits;

pub use docker::DockerPostgresStore;
pub use mock::{MockStore, StoreCall};
pub use traits::*;
