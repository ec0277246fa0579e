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

//! Select and database administration: USE/CURRENT over selects, the
//! DB* family over the registry, and the flusher reset.

use super::{CommandDef, Outcome, Session, def, parse_select, query_ctx};
use crate::server::Server;
use beryl_common::{Numeric, PROCESS_ALREADY, PROCESS_OK};
use beryl_db::query::keys::DbSizeQuery;
use beryl_db::{CORE_DB, StoreError};

pub fn defs() -> Vec<CommandDef> {
    vec![
        CommandDef {
            name: "USE",
            group: 'a',
            syntax: "<id between 1 and 100>",
            min_args: 1,
            max_args: 1,
            pre_auth: true,
            requires: None,
            handler: use_select,
        },
        CommandDef {
            name: "USING",
            group: 'a',
            syntax: "<instance>",
            min_args: 1,
            max_args: 1,
            pre_auth: false,
            requires: Some('m'),
            handler: using,
        },
        def("CURRENT", 'a', "", 0, 0, current),
        def("DBRESET", 'a', "", 0, 0, dbreset),
        def("DBSIZE", 'a', "", 0, 0, dbsize),
        def("PWD", 'a', "", 0, 0, pwd),
        CommandDef {
            name: "DBCREATE",
            group: 'a',
            syntax: "<name>",
            min_args: 1,
            max_args: 1,
            pre_auth: false,
            requires: Some('e'),
            handler: dbcreate,
        },
        CommandDef {
            name: "DBDELETE",
            group: 'a',
            syntax: "<name>",
            min_args: 1,
            max_args: 1,
            pre_auth: false,
            requires: Some('e'),
            handler: dbdelete,
        },
        def("DBLIST", 'a', "", 0, 0, dblist),
        def("DBCHANGE", 'a', "<name>", 1, 1, dbchange),
    ]
}

fn use_select(_server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(select) = parse_select(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    if session.user.select() == select {
        session
            .user
            .send(Numeric::ErrUse, format!("{select} {PROCESS_ALREADY}"));
        return Outcome::Continue;
    }
    session.user.set_select(&select);
    session
        .user
        .send(Numeric::NewUse, format!("{select} {PROCESS_OK}"));
    Outcome::Continue
}

fn using(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    match server.clients.find(&args[0]) {
        Some(found) => session.user.send(Numeric::Using, found.select()),
        None => session
            .user
            .send(Numeric::ErrNoInstance, "Instance not found."),
    }
    Outcome::Continue
}

fn current(_server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    session
        .user
        .send(Numeric::CurrentUse, session.user.select());
    Outcome::Continue
}

fn dbreset(server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    if !server.flusher.is_active() {
        session.user.send(Numeric::ErrInput, "Already paused.");
        return Outcome::Continue;
    }
    server.flusher.reset_all();
    session.user.send(Numeric::QueryOk, PROCESS_OK);
    Outcome::Continue
}

fn dbsize(server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(DbSizeQuery::new(ctx));
    Outcome::Continue
}

fn pwd(_server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    let Some(database) = session.user.database() else {
        session
            .user
            .send(Numeric::ErrInput, "No database selected.");
        return Outcome::Continue;
    };
    session
        .user
        .send(Numeric::Ok, database.path().display().to_string());
    Outcome::Continue
}

fn valid_db_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 32
        && name != CORE_DB
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn dbcreate(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let name = &args[0];
    if !valid_db_name(name) {
        session.user.send(Numeric::ErrInput, "Invalid database name.");
        return Outcome::Continue;
    }
    match server.manager.create(name) {
        Ok(_) => session.user.send(Numeric::QueryOk, PROCESS_OK),
        Err(StoreError::DatabaseExists(_)) => session
            .user
            .send(Numeric::EntryExists, "Database already exists."),
        Err(e) => session.user.send(Numeric::ErrInput, e.to_string()),
    }
    Outcome::Continue
}

fn dbdelete(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let name = args[0].clone();
    if !valid_db_name(&name) {
        session.user.send(Numeric::ErrInput, "Invalid database name.");
        return Outcome::Continue;
    }
    // Teardown drains in-flight queries; keep the runtime's other tasks
    // moving while this connection blocks on it.
    let result =
        tokio::task::block_in_place(|| server.manager.delete(&name));
    match result {
        Ok(()) => session.user.send(Numeric::QueryOk, PROCESS_OK),
        Err(StoreError::NoSuchDatabase(_)) => {
            session.user.send(Numeric::NotFound, "Database not found.")
        }
        Err(e) => session.user.send(Numeric::ErrInput, e.to_string()),
    }
    Outcome::Continue
}

fn dblist(server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    session.user.send(Numeric::StartList, "BEGIN");
    let default = server.manager.default_db().map(|db| db.name().to_string());
    for database in server.manager.list() {
        let marker = if Some(database.name()) == default.as_deref() {
            " (default)"
        } else {
            ""
        };
        session
            .user
            .send(Numeric::ItemList, format!("{}{marker}", database.name()));
    }
    session.user.send(Numeric::EndList, "END");
    Outcome::Continue
}

fn dbchange(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    match server.manager.find(&args[0]) {
        Some(database) => {
            session.user.set_database(database);
            session.user.send(Numeric::QueryOk, PROCESS_OK);
        }
        None => session.user.send(Numeric::NotFound, "Database not found."),
    }
    Outcome::Continue
}
