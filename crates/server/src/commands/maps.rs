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

//! Commands related to maps, such as HSET, HGET and HGETALL.

use super::{CommandDef, Outcome, Session, def, parse_limits, query_ctx};
use crate::server::Server;
use beryl_db::query::maps::{
    HCountQuery, HDelQuery, HExistsQuery, HFindQuery, HGetAllQuery, HGetQuery, HListQuery,
    HSetNxQuery, HSetQuery, HStrlenQuery, HValsQuery, HWDelQuery,
};

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("HSET", 'm', "<map> <key> \"value\"", 3, 3, hset),
        def("HSETNX", 'm', "<map> <key> \"value\"", 3, 3, hsetnx),
        def("HGET", 'm', "<map> <key>", 2, 2, hget),
        def("HDEL", 'm', "<map> <key>", 2, 2, hdel),
        def("HEXISTS", 'm', "<map> <key>", 2, 2, hexists),
        def("HSTRLEN", 'm', "<map> <key>", 2, 2, hstrlen),
        def("HCOUNT", 'm', "<map>", 1, 1, hcount),
        def("HFIND", 'm', "<%map> <offset> <limit>", 1, 3, hfind),
        def("HLIST", 'm', "<map> <offset> <limit>", 1, 3, hlist),
        def("HVALS", 'm', "<map> <offset> <limit>", 1, 3, hvals),
        def("HGETALL", 'm', "<map> <offset> <limit>", 1, 3, hgetall),
        def("HWDEL", 'm', "<map> <%key>", 2, 2, hwdel),
    ]
}

fn hset(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(HSetQuery::new(
        ctx,
        args[0].clone(),
        args[1].clone(),
        args[2].clone(),
    ));
    Outcome::Continue
}

fn hsetnx(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(HSetNxQuery::new(
        ctx,
        args[0].clone(),
        args[1].clone(),
        args[2].clone(),
    ));
    Outcome::Continue
}

fn hget(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HGetQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn hdel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HDelQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn hexists(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HExistsQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn hstrlen(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HStrlenQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn hcount(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HCountQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn hfind(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HFindQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn hlist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HListQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn hvals(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HValsQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn hgetall(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HGetAllQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn hwdel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(HWDelQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}
