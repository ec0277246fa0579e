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

//! Command layer: tokenized lines are resolved against the static command
//! table, validated (auth, flags, arity, numeric shape), and turned into
//! queries for the flusher or answered inline. Everything here runs on the
//! connection task, never on a worker.

use crate::server::Server;
use beryl_common::{
    Numeric, is_zero_or_greater, is_zero_or_greater_or_mone, parse_params,
};
use beryl_db::{Limits, QueryCtx, User};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

mod dbmanager;
mod futures;
mod geo;
mod info;
mod keys;
mod login;
mod maps;
mod monitor;
mod multis;
mod vectors;

pub const MUST_BE_NUMERIC: &str = "Value must be numeric.";
pub const MUST_BE_POSIT: &str = "Value must be positive.";
pub const MUST_BE_GREAT_ZERO: &str = "Value must be 0 or greater.";
pub const DATABASE_BUSY: &str = "Database is busy.";
pub const ACCESS_DENIED: &str = "Access denied.";

/// Session-local state riding alongside the user handle.
pub struct Session {
    pub user: Arc<User>,
    pub authed: bool,
    pub login: Option<String>,
    pub flags: String,
}

impl Session {
    pub fn new(user: Arc<User>) -> Self {
        Self {
            user,
            authed: false,
            login: None,
            flags: String::new(),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Continue,
    Quit,
}

pub type Handler = fn(&Server, &mut Session, &[String]) -> Outcome;

pub struct CommandDef {
    pub name: &'static str,
    /// Family tag. Data groups are echoed to DEFAULT-level monitors.
    pub group: char,
    pub syntax: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    /// May run before authentication.
    pub pre_auth: bool,
    /// ACL flag the session must carry ('r' implies all).
    pub requires: Option<char>,
    pub handler: Handler,
}

lazy_static! {
    static ref TABLE: HashMap<&'static str, CommandDef> = {
        let mut table = HashMap::new();
        let defs = keys::defs()
            .into_iter()
            .chain(maps::defs())
            .chain(multis::defs())
            .chain(vectors::defs())
            .chain(geo::defs())
            .chain(futures::defs())
            .chain(dbmanager::defs())
            .chain(monitor::defs())
            .chain(info::defs())
            .chain(login::defs());
        for def in defs {
            let prior = table.insert(def.name, def);
            debug_assert!(prior.is_none(), "duplicate command registration");
        }
        table
    };
}

pub fn lookup(name: &str) -> Option<&'static CommandDef> {
    TABLE.get(name)
}

fn is_data_group(group: char) -> bool {
    matches!(group, 'k' | 'm' | 'x' | 'v' | 'g' | 'f' | 'e')
}

/// Process one tokenized command line from a session.
pub fn handle_line(server: &Server, session: &mut Session, line: &str) -> Outcome {
    let params = parse_params(line);
    let Some((name, args)) = params.split_first() else {
        return Outcome::Continue;
    };
    let name = name.to_ascii_uppercase();

    let Some(def) = lookup(name.as_str()) else {
        session
            .user
            .send(Numeric::ErrInput, format!("Unknown command: {name}"));
        return Outcome::Continue;
    };

    if !session.authed && !def.pre_auth {
        session
            .user
            .send(Numeric::ErrLogin, "You must authenticate first.");
        return Outcome::Continue;
    }

    if let Some(required) = def.requires
        && !(session.flags.contains(required) || session.flags.contains('r'))
    {
        session.user.send(Numeric::ErrInput, ACCESS_DENIED);
        return Outcome::Continue;
    }

    if args.len() < def.min_args || args.len() > def.max_args {
        if server.settings.as_bool("syntaxhints") && !def.syntax.is_empty() {
            session
                .user
                .send(Numeric::ErrUse, format!("{} {}", def.name, def.syntax));
        } else {
            session.user.send(Numeric::ErrUse, "Invalid parameters.");
        }
        return Outcome::Continue;
    }

    debug!(instance = %session.user.instance(), command = %def.name, "dispatching");
    let outcome = (def.handler)(server, session, args);

    // Monitors see the raw line, so credentials must never reach them.
    if def.name != "AUTH" {
        server
            .monitors
            .broadcast(&session.user, line, is_data_group(def.group));
    }
    outcome
}

// ---------------------------------------------------------------------------
// Shared validation helpers for the command modules.
// ---------------------------------------------------------------------------

/// An ordinary data command: authenticated, unflagged, named group.
pub(crate) fn def(
    name: &'static str,
    group: char,
    syntax: &'static str,
    min_args: usize,
    max_args: usize,
    handler: Handler,
) -> CommandDef {
    CommandDef {
        name,
        group,
        syntax,
        min_args,
        max_args,
        pre_auth: false,
        requires: None,
        handler,
    }
}

/// The query context for a data command, or `None` with the error frame
/// already sent.
pub(crate) fn query_ctx(session: &Session) -> Option<QueryCtx> {
    let Some(database) = session.user.database() else {
        session
            .user
            .send(Numeric::ErrInput, "No database selected.");
        return None;
    };
    if database.is_closing() {
        session.user.send(Numeric::ErrInput, DATABASE_BUSY);
        return None;
    }
    Some(QueryCtx::for_user(&session.user, database))
}

/// The current database and select for a timer-index command, or `None`
/// with the error frame already sent.
pub(crate) fn db_and_select(
    session: &Session,
) -> Option<(Arc<beryl_db::Database>, String)> {
    let Some(database) = session.user.database() else {
        session
            .user
            .send(Numeric::ErrInput, "No database selected.");
        return None;
    };
    if database.is_closing() {
        session.user.send(Numeric::ErrInput, DATABASE_BUSY);
        return None;
    }
    let select = session.user.select();
    Some((database, select))
}

/// Parse the optional trailing `[offset] limit` pair starting at `base`.
/// Rejects negatives; `-1` stays the unbounded-limit sentinel.
pub(crate) fn parse_limits(user: &User, args: &[String], base: usize) -> Option<Limits> {
    match args.len().saturating_sub(base) {
        0 => Some(Limits::default()),
        1 => {
            let limit = &args[base];
            if !is_zero_or_greater_or_mone(limit) {
                user.send(Numeric::ErrInput, MUST_BE_GREAT_ZERO);
                return None;
            }
            Some(Limits {
                offset: 0,
                limit: limit.parse().ok()?,
            })
        }
        _ => {
            let offset = &args[base];
            let limit = &args[base + 1];
            if !is_zero_or_greater(offset) || !is_zero_or_greater_or_mone(limit) {
                user.send(Numeric::ErrInput, MUST_BE_GREAT_ZERO);
                return None;
            }
            Some(Limits {
                offset: offset.parse().ok()?,
                limit: limit.parse().ok()?,
            })
        }
    }
}

/// A positive integer argument, or `None` with the error frame sent.
pub(crate) fn parse_positive(user: &User, value: &str) -> Option<i64> {
    if !beryl_common::is_number(value, false) {
        user.send(Numeric::ErrInput, MUST_BE_NUMERIC);
        return None;
    }
    if !beryl_common::is_positive_number(value) {
        user.send(Numeric::ErrInput, MUST_BE_POSIT);
        return None;
    }
    value.parse().ok()
}

/// A non-negative integer argument.
pub(crate) fn parse_unsigned(user: &User, value: &str) -> Option<usize> {
    if !is_zero_or_greater(value) {
        user.send(Numeric::ErrInput, MUST_BE_GREAT_ZERO);
        return None;
    }
    value.parse().ok()
}

/// A select argument: "1".."100".
pub(crate) fn parse_select(user: &User, value: &str) -> Option<String> {
    if !beryl_common::valid_select(value) {
        user.send(Numeric::ErrUse, "Must be a value between 1 and 100.");
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::server::Server;
    use beryl_common::Frame;

    fn test_server() -> (tempfile::TempDir, Arc<Server>) {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().join("data"),
            workers: 1,
            ..Default::default()
        };
        let server = Server::new(config).unwrap();
        server.flusher.resume();
        (dir, server)
    }

    fn session(server: &Server) -> (Session, flume::Receiver<Frame>) {
        let (user, frames) = User::new("tester");
        user.set_database(server.manager.default_db().unwrap());
        server.clients.add(user.clone());
        (Session::new(user), frames)
    }

    fn login(server: &Server, session: &mut Session, frames: &flume::Receiver<Frame>) {
        assert_eq!(
            handle_line(server, session, "AUTH root default"),
            Outcome::Continue
        );
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::Login);
        assert!(session.authed);
    }

    #[test]
    fn data_commands_require_auth() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        handle_line(&server, &mut session, "GET foo");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::ErrLogin);
    }

    #[test]
    fn auth_accepts_root_and_rejects_garbage() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        handle_line(&server, &mut session, "AUTH root wrong");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::ErrLogin);
        assert!(!session.authed);
        login(&server, &mut session, &frames);
        assert_eq!(session.flags, "r");
    }

    #[test]
    fn use_validates_select_range() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        handle_line(&server, &mut session, "USE 101");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::ErrUse);
        handle_line(&server, &mut session, "USE 2");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::NewUse);
        assert_eq!(session.user.select(), "2");
        handle_line(&server, &mut session, "USE 2");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::ErrUse);
    }

    #[test]
    fn negative_offsets_are_rejected() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        login(&server, &mut session, &frames);
        handle_line(&server, &mut session, "KEYS * -5 10");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::ErrInput);
        // -1 stays the unbounded sentinel for the limit position.
        handle_line(&server, &mut session, "KEYS * 0 -1");
        assert!(frames.try_recv().is_err(), "query should have been submitted");
    }

    #[test]
    fn unknown_command_and_arity_hint() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        login(&server, &mut session, &frames);
        handle_line(&server, &mut session, "FROB x");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::ErrInput);
        handle_line(&server, &mut session, "SET onlykey");
        let frame = frames.try_recv().unwrap();
        assert_eq!(frame.numeric, Numeric::ErrUse);
        assert!(frame.payload.starts_with("SET"), "syntax hint expected");
    }

    #[test]
    fn admin_commands_check_flags() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        login(&server, &mut session, &frames);
        // Root carries 'r', which implies every flag.
        handle_line(&server, &mut session, "MONITORLIST");
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::StartList);
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::EndList);

        session.flags.clear();
        handle_line(&server, &mut session, "MONITORLIST");
        let frame = frames.try_recv().unwrap();
        assert_eq!(frame.numeric, Numeric::ErrInput);
        assert_eq!(frame.payload, ACCESS_DENIED);
    }

    #[test]
    fn quit_ends_the_session() {
        let (_dir, server) = test_server();
        let (mut session, frames) = session(&server);
        assert_eq!(handle_line(&server, &mut session, "QUIT"), Outcome::Quit);
        assert_eq!(frames.try_recv().unwrap().numeric, Numeric::Ok);
    }
}
