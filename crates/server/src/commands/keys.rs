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

//! Commands related to plain keys, such as SET, GET and DEL.

use super::{CommandDef, Outcome, Session, def, parse_limits, parse_positive, parse_unsigned, query_ctx};
use crate::server::Server;
use beryl_db::query::keys::{
    AppendQuery, CountQuery, DelQuery, GetDelQuery, GetExpQuery, GetOccursQuery, GetPersistQuery,
    GetQuery, GetSetQuery, GetSubstrQuery, IsAlphaQuery, IsNumQuery, KeysQuery, RKeyQuery,
    SearchQuery, SetNxQuery, SetQuery, SetTxQuery, StrlenQuery, TouchQuery, WDelQuery,
};

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("SET", 'k', "<key> \"value\"", 2, 2, set),
        def("SETNX", 'k', "<key> \"value\"", 2, 2, setnx),
        def("SETTX", 'k', "<seconds> <key> \"value\"", 3, 3, settx),
        def("GET", 'k', "<key>", 1, 1, get),
        def("GETDEL", 'k', "<key>", 1, 1, getdel),
        def("GETSET", 'k', "<key> \"value\"", 2, 2, getset),
        def("GETSUBSTR", 'k', "<key> <from> <to>", 3, 3, getsubstr),
        def("GETOCCURS", 'k', "<key> \"value\"", 2, 2, getoccurs),
        def("GETEXP", 'k', "<seconds> <key>", 2, 2, getexp),
        def("GETPERSIST", 'k', "<key>", 1, 1, getpersist),
        def("STRLEN", 'k', "<key>", 1, 1, strlen),
        def("APPEND", 'k', "<key> \"value\"", 2, 2, append),
        def("TOUCH", 'k', "<key> [<key>...]", 1, usize::MAX, touch),
        def("RKEY", 'k', "", 0, 0, rkey),
        def("ISALPHA", 'k', "<key>", 1, 1, isalpha),
        def("ISNUM", 'k', "<key>", 1, 1, isnum),
        def("DEL", 'k', "<key>", 1, 1, del),
        def("KEYS", 'k', "<%key> <offset> <limit>", 1, 3, keys),
        def("COUNT", 'k', "<%key>", 0, 1, count),
        def("SEARCH", 'k', "<%key> <offset> <limit>", 1, 3, search),
        def("WDEL", 'k', "<%key>", 1, 1, wdel),
    ]
}

fn set(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(SetQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn setnx(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(SetNxQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn settx(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(seconds) = parse_positive(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(SetTxQuery::new(
        ctx,
        args[1].clone(),
        args[2].clone(),
        seconds,
    ));
    Outcome::Continue
}

fn get(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(GetQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn getdel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GetDelQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn getset(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GetSetQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn getsubstr(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(from) = parse_unsigned(&session.user, &args[1]) else {
        return Outcome::Continue;
    };
    let Some(to) = parse_unsigned(&session.user, &args[2]) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GetSubstrQuery::new(ctx, args[0].clone(), from, to));
    Outcome::Continue
}

fn getoccurs(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GetOccursQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn getexp(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(seconds) = parse_positive(&session.user, &args[0]) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GetExpQuery::new(ctx, args[1].clone(), seconds));
    Outcome::Continue
}

fn getpersist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GetPersistQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn strlen(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(StrlenQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn append(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(AppendQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn touch(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(TouchQuery::new(ctx, args.to_vec()));
    Outcome::Continue
}

fn rkey(server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(RKeyQuery::new(ctx));
    Outcome::Continue
}

fn isalpha(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(IsAlphaQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn isnum(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(IsNumQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn del(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(DelQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn keys(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(KeysQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn count(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let pattern = args.first().cloned().unwrap_or_else(|| "*".to_string());
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(CountQuery::new(ctx, pattern));
    Outcome::Continue
}

fn search(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(SearchQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn wdel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(WDelQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}
