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

//! Dispatcher side of the pipeline: the event loop drains completed queries
//! off the outbound queue and formats user-visible frames. `process()` is
//! non-blocking and never performs store I/O.

use crate::query::Submitted;

/// Handle one completed query: successful ones format their own output, a
/// recorded error kind becomes a single error frame.
pub fn dispatch_one(submitted: Submitted) {
    match submitted.error {
        None => submitted.query.process(),
        Some(kind) => {
            if let Some(user) = submitted.query.user() {
                user.send(kind.numeric(), kind.payload());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::User;
    use crate::database::Database;
    use crate::error::QueryError;
    use crate::query::QueryCtx;
    use crate::query::keys::GetQuery;

    #[test]
    fn errors_become_one_frame() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open("t", dir.path()).unwrap();
        let (user, frames) = User::new("test");
        let ctx = QueryCtx::for_user(&user, db);
        let mut submitted = Submitted::new(GetQuery::new(ctx, "missing".into()));
        submitted.error = Some(QueryError::NotFound);
        dispatch_one(submitted);
        let frame = frames.try_recv().unwrap();
        assert_eq!(frame.to_string(), "520 NULL");
        assert!(frames.try_recv().is_err());
    }
}
