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

//! Commands related to multimaps, such as MSET, MGET and MSEEK.

use super::{CommandDef, Outcome, Session, def, parse_limits, query_ctx};
use crate::server::Server;
use beryl_db::query::multis::{MDelQuery, MGetQuery, MKeysQuery, MSeekQuery, MSetQuery};

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("MSET", 'x', "<mmap> <key> \"value\"", 3, 3, mset),
        def("MGET", 'x', "<mmap> <offset> <limit>", 1, 3, mget),
        def("MDEL", 'x', "<mmap> <key>", 2, 2, mdel),
        def("MKEYS", 'x', "<%mmap> <offset> <limit>", 1, 3, mkeys),
        def("MSEEK", 'x', "<mmap> \"value\" <offset> <limit>", 2, 4, mseek),
    ]
}

fn mset(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(MSetQuery::new(
        ctx,
        args[0].clone(),
        args[1].clone(),
        args[2].clone(),
    ));
    Outcome::Continue
}

fn mget(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(MGetQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn mdel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(MDelQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn mkeys(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(MKeysQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn mseek(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 2) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(MSeekQuery::new(
        ctx,
        args[0].clone(),
        args[1].clone(),
        limits,
    ));
    Outcome::Continue
}
