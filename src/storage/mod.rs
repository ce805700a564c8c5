// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// On-disk housekeeping for index directories

pub mod cleanup;
pub mod paths;

pub use cleanup::{
    is_lock_error, parked_path, safe_remove_database, safe_remove_database_with, CleanupPolicy,
    RealFs, StoreFs,
};
pub use paths::{unique_database_path, unique_database_path_at, DEFAULT_DB_BASE, TIMESTAMP_FORMAT};
