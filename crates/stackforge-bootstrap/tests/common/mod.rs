// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use stackforge_bootstrap::store::{MockStore, StoreCall};

/// Owned database list from string literals.
pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Wrap a mock store so it can be shared with the code under test.
pub fn shared(store: MockStore) -> Arc<MockStore> {
    Arc::new(store)
}

/// Calls other than probes, in order.
pub async fn catalog_calls(store: &MockStore) -> Vec<StoreCall> {
    store
        .calls()
        .await
        .into_iter()
        .filter(|call| *call != StoreCall::Probe)
        .collect()
}
