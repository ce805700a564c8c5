// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Index directory naming

use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

/// Default base for index directories; also the leftover name removed by clear-all
pub const DEFAULT_DB_BASE: &str = "./vector_db";

/// Timestamp suffix format, one-second granularity
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<base>_<YYYYMMDD_HHMMSS>` for the given instant
///
/// Two uploads within the same second get the same name; callers that need a
/// fresh directory should remove the previous one first.
pub fn unique_database_path_at<Tz: TimeZone>(base: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let mut name = base.as_os_str().to_os_string();
    name.push("_");
    name.push(now.format(TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// `<base>_<YYYYMMDD_HHMMSS>` for the current local time
pub fn unique_database_path(base: &Path) -> PathBuf {
    unique_database_path_at(base, &Local::now())
}
