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

use beryl_common::{Numeric, PROCESS_NULL};
use thiserror::Error;

/// Terminal error states a query `run()` can end in. The worker records the
/// kind on the completed query; the dispatcher turns it into a single error
/// frame. Errors never unwind across `run()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum QueryError {
    #[error("missing arguments")]
    MissArgs,
    #[error("entry not found")]
    NotFound,
    #[error("unable to write entry")]
    UnableWrite,
    #[error("entry already exists")]
    EntryExists,
    #[error("invalid range")]
    InvalidRange,
    #[error("invalid format")]
    InvalidFormat,
    #[error("interrupted")]
    Interrupt,
    #[error("invalid coordinate")]
    InvalidCoord,
}

impl QueryError {
    /// Wire numeric the dispatcher emits for this kind.
    pub fn numeric(&self) -> Numeric {
        match self {
            QueryError::MissArgs => Numeric::MissArgs,
            QueryError::NotFound => Numeric::NotFound,
            QueryError::UnableWrite => Numeric::UnableWrite,
            QueryError::EntryExists => Numeric::EntryExists,
            QueryError::InvalidRange => Numeric::InvalidRange,
            QueryError::InvalidFormat => Numeric::InvalidFormat,
            QueryError::Interrupt => Numeric::Interrupt,
            QueryError::InvalidCoord => Numeric::InvalidCoord,
        }
    }

    pub fn payload(&self) -> &'static str {
        match self {
            QueryError::MissArgs => "MISSING_ARGUMENTS",
            QueryError::NotFound => PROCESS_NULL,
            QueryError::UnableWrite => "UNABLE_TO_WRITE",
            QueryError::EntryExists => "ENTRY_EXISTS",
            QueryError::InvalidRange => "INVALID_RANGE",
            QueryError::InvalidFormat => "INVALID_FORMAT",
            QueryError::Interrupt => "INTERRUPTED",
            QueryError::InvalidCoord => "INVALID_COORDINATE",
        }
    }
}

/// Failures reported by the physical store or the database registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("database '{0}' not found")]
    NoSuchDatabase(String),
    #[error("database '{0}' already exists")]
    DatabaseExists(String),
    #[error("database '{0}' is busy closing")]
    DatabaseBusy(String),
}

impl From<fjall::Error> for StoreError {
    fn from(e: fjall::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}
