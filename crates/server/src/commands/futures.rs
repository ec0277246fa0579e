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

//! Commands over the timer indices: expirations (EXPIRE, TTL, PERSIST) and
//! futures (FUTURE, FUTSET, CANCEL, EXEC, TTE) plus their listings. These
//! operate on the in-memory schedules directly; only a firing touches the
//! store.

use super::{
    CommandDef, DATABASE_BUSY, Outcome, Session, db_and_select, def, parse_positive, parse_select,
};
use crate::server::Server;
use beryl_common::{Numeric, PROCESS_ERROR, PROCESS_NULL, PROCESS_OK};
use beryl_db::{ScheduleEntry, User, now_secs};

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("EXPIRE", 'e', "<seconds> <key>", 2, 2, expire),
        def("EXPIREAT", 'e', "<epoch time> <key>", 2, 2, expireat),
        def("TTL", 'e', "<key>", 1, 1, ttl),
        def("PERSIST", 'e', "<key>", 1, 1, persist),
        def("EXPLIST", 'e', "<*argument>", 0, 1, explist),
        def("EXSELECT", 'e', "<select>", 0, 1, exselect),
        def("FUTURE", 'f', "<seconds> <key> \"value\"", 3, 3, future),
        def("FUTSET", 'f', "<epoch time> <key> \"value\"", 3, 3, futset),
        def("CANCEL", 'f', "<key>", 1, 1, cancel),
        def("EXEC", 'f', "<key>", 1, 1, exec),
        def("TTE", 'f', "<key>", 1, 1, tte),
        def("FRESET", 'f', "<*select>", 0, 1, freset),
        CommandDef {
            name: "FRESETALL",
            group: 'f',
            syntax: "",
            min_args: 0,
            max_args: 0,
            pre_auth: false,
            requires: Some('e'),
            handler: fresetall,
        },
        def("FTLIST", 'f', "<*argument>", 0, 1, ftlist),
        def("FTSELECT", 'f', "<select>", 0, 1, ftselect),
    ]
}

fn expire(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(seconds) = parse_positive(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    server
        .expires
        .add(database, &select, &args[1], seconds, false, now_secs());
    session.user.send(Numeric::QueryOk, PROCESS_OK);
    Outcome::Continue
}

fn expireat(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(epoch) = parse_positive(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    if epoch < now_secs() {
        session.user.send(Numeric::ErrInput, PROCESS_ERROR);
        return Outcome::Continue;
    }
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    server
        .expires
        .add(database, &select, &args[1], epoch, true, now_secs());
    session.user.send(Numeric::QueryOk, PROCESS_OK);
    Outcome::Continue
}

fn ttl(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    match server.expires.trigger_time(database.name(), &select, &args[0]) {
        Some(fire_at) => {
            let remaining = (fire_at - now_secs()).max(0);
            session.user.send(Numeric::Ok, remaining.to_string());
        }
        None => session.user.send(Numeric::ErrInput, PROCESS_NULL),
    }
    Outcome::Continue
}

fn persist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    if server.expires.delete(database.name(), &select, &args[0]) {
        session.user.send(Numeric::QueryOk, PROCESS_OK);
    } else {
        session.user.send(Numeric::NotFound, PROCESS_NULL);
    }
    Outcome::Continue
}

fn future(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(seconds) = parse_positive(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    if args[2].is_empty() {
        session.user.send(Numeric::ErrInput, "Invalid value.");
        return Outcome::Continue;
    }
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    server.futures.add(
        database,
        &select,
        &args[1],
        seconds,
        false,
        now_secs(),
        args[2].clone(),
    );
    session.user.send(Numeric::QueryOk, PROCESS_OK);
    Outcome::Continue
}

fn futset(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(epoch) = parse_positive(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    if epoch < now_secs() {
        session.user.send(Numeric::ErrInput, PROCESS_ERROR);
        return Outcome::Continue;
    }
    if args[2].is_empty() {
        session.user.send(Numeric::ErrInput, "Invalid value.");
        return Outcome::Continue;
    }
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    server.futures.add(
        database,
        &select,
        &args[1],
        epoch,
        true,
        now_secs(),
        args[2].clone(),
    );
    session.user.send(Numeric::QueryOk, PROCESS_OK);
    Outcome::Continue
}

fn cancel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    if server.futures.delete(database.name(), &select, &args[0]) {
        session.user.send(Numeric::QueryOk, PROCESS_OK);
    } else {
        session.user.send(Numeric::NotFound, PROCESS_NULL);
    }
    Outcome::Continue
}

fn exec(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    if server
        .futures
        .execute(database.name(), &select, &args[0], &server.flusher)
    {
        session.user.send(Numeric::QueryOk, PROCESS_OK);
    } else {
        session.user.send(Numeric::NotFound, PROCESS_NULL);
    }
    Outcome::Continue
}

/// Trigger time for a pending timer on the key: futures first, expirations
/// as a fallback.
fn tte(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some((database, select)) = db_and_select(session) else {
        return Outcome::Continue;
    };
    let fire_at = server
        .futures
        .trigger_time(database.name(), &select, &args[0])
        .or_else(|| server.expires.trigger_time(database.name(), &select, &args[0]));
    match fire_at {
        Some(fire_at) => {
            let remaining = (fire_at - now_secs()).max(0);
            session.user.send(Numeric::Ok, remaining.to_string());
        }
        None => session.user.send(Numeric::ErrInput, PROCESS_NULL),
    }
    Outcome::Continue
}

fn freset(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let select = if let Some(arg) = args.first() {
        let Some(select) = parse_select(&session.user, arg) else {
            return Outcome::Continue;
        };
        select
    } else {
        session.user.select()
    };
    let Some(database) = session.user.database() else {
        session.user.send(Numeric::ErrInput, "No database selected.");
        return Outcome::Continue;
    };
    if database.is_closing() {
        session.user.send(Numeric::ErrInput, DATABASE_BUSY);
        return Outcome::Continue;
    }
    server.futures.select_reset(database.name(), &select);
    session.user.send(Numeric::Ok, PROCESS_OK);
    Outcome::Continue
}

fn fresetall(server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    server.futures.reset();
    session.user.send(Numeric::Ok, PROCESS_OK);
    Outcome::Continue
}

fn explist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    emit_schedule(&session.user, server.expires.entries(), args.first(), None)
}

fn exselect(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let select = match args.first() {
        Some(arg) => match parse_select(&session.user, arg) {
            Some(select) => select,
            None => return Outcome::Continue,
        },
        None => session.user.select(),
    };
    let filter = session.user.database().map(|db| (db.name().to_string(), select));
    emit_schedule(&session.user, server.expires.entries(), None, filter)
}

fn ftlist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    emit_schedule(&session.user, server.futures.entries(), args.first(), None)
}

fn ftselect(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let select = match args.first() {
        Some(arg) => match parse_select(&session.user, arg) {
            Some(select) => select,
            None => return Outcome::Continue,
        },
        None => session.user.select(),
    };
    let filter = session.user.database().map(|db| (db.name().to_string(), select));
    emit_schedule(&session.user, server.futures.entries(), None, filter)
}

/// Bracketed listing of schedule entries: `<key> <schedule> <select> <db>`.
/// The optional argument picks the schedule column format: `h` readable
/// (the default), `r` raw epoch seconds.
fn emit_schedule(
    user: &User,
    entries: Vec<ScheduleEntry>,
    format_arg: Option<&String>,
    filter: Option<(String, String)>,
) -> Outcome {
    let raw = match format_arg.map(String::as_str) {
        None | Some("h") => false,
        Some("r") => true,
        Some(_) => {
            user.send(Numeric::ErrInput, "Invalid type.");
            return Outcome::Continue;
        }
    };
    user.send(Numeric::StartList, "BEGIN");
    for entry in entries {
        if let Some((database, select)) = &filter
            && !(entry.database.name() == database && &entry.select == select)
        {
            continue;
        }
        let schedule = if raw {
            entry.schedule.to_string()
        } else {
            human_epoch(entry.schedule)
        };
        user.send(
            Numeric::ItemList,
            format!(
                "{} {} {} {}",
                entry.key,
                schedule,
                entry.select,
                entry.database.name()
            ),
        );
    }
    user.send(Numeric::EndList, "END");
    Outcome::Continue
}

fn human_epoch(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}
