// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Query execution and storage core. Logical entries are encoded into one
//! flat keyspace per database; queries run on a worker pool off the event
//! loop, stream large answers in partial chunks, and the second-granularity
//! timer indices fire expirations and deferred writes.

pub use clients::User;
pub use database::Database;
pub use dispatch::dispatch_one;
pub use error::{QueryError, StoreError};
pub use expires::{ExpireIndex, FutureIndex, ScheduleEntry};
pub use flusher::Flusher;
pub use manager::{CORE_DB, CoreDb, DbManager};
pub use query::{ITER_LIMIT, Limits, Query, QueryCtx, Submitted};

pub mod clients;
pub mod codec;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod expires;
pub mod flusher;
pub mod keys;
pub mod manager;
pub mod query;
pub mod store;

/// Wall-clock seconds since the epoch. The granularity every timer in the
/// system works at.
pub fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
