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

//! Commands related to vectors, such as VPUSH, VGET and the numeric
//! aggregates.

use super::{CommandDef, Outcome, Session, def, parse_limits, parse_unsigned, query_ctx};
use crate::server::Server;
use beryl_db::query::vectors::{
    VAvgQuery, VBackQuery, VCountQuery, VDelQuery, VExistQuery, VFindQuery, VFrontQuery,
    VGetQuery, VHighQuery, VKeysQuery, VLowQuery, VPopBackQuery, VPopFrontQuery, VPosQuery,
    VPushNxQuery, VPushQuery, VRepeatsQuery, VResizeQuery, VReverseQuery, VSortQuery, VSumQuery,
};

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("VPUSH", 'v', "<vector> \"value\"", 2, 2, vpush),
        def("VPUSHNX", 'v', "<vector> \"value\"", 2, 2, vpushnx),
        def("VGET", 'v', "<vector> <offset> <limit>", 1, 3, vget),
        def("VPOP_FRONT", 'v', "<vector>", 1, 1, vpop_front),
        def("VPOP_BACK", 'v', "<vector>", 1, 1, vpop_back),
        def("VDEL", 'v', "<vector> \"value\"", 2, 2, vdel),
        def("VCOUNT", 'v', "<vector>", 1, 1, vcount),
        def("VPOS", 'v', "<vector> <position>", 2, 2, vpos),
        def("VEXIST", 'v', "<vector> \"value\"", 2, 2, vexist),
        def("VSORT", 'v', "<vector>", 1, 1, vsort),
        def("VREVERSE", 'v', "<vector>", 1, 1, vreverse),
        def("VRESIZE", 'v', "<vector> <size>", 2, 2, vresize),
        def("VFIND", 'v', "<vector> <%value> <offset> <limit>", 2, 4, vfind),
        def("VKEYS", 'v', "<%vector> <offset> <limit>", 1, 3, vkeys),
        def("VREPEATS", 'v', "<vector> \"value\"", 2, 2, vrepeats),
        def("VAVG", 'v', "<vector>", 1, 1, vavg),
        def("VHIGH", 'v', "<vector>", 1, 1, vhigh),
        def("VLOW", 'v', "<vector>", 1, 1, vlow),
        def("VSUM", 'v', "<vector>", 1, 1, vsum),
        def("VBACK", 'v', "<vector>", 1, 1, vback),
        def("VFRONT", 'v', "<vector>", 1, 1, vfront),
    ]
}

fn vpush(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VPushQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn vpushnx(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VPushNxQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn vget(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VGetQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn vpop_front(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VPopFrontQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vpop_back(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VPopBackQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vdel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VDelQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn vcount(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VCountQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vpos(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(position) = parse_unsigned(&session.user, &args[1]) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VPosQuery::new(ctx, args[0].clone(), position));
    Outcome::Continue
}

fn vexist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VExistQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn vsort(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VSortQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vreverse(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VReverseQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vresize(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(size) = parse_unsigned(&session.user, &args[1]) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VResizeQuery::new(ctx, args[0].clone(), size));
    Outcome::Continue
}

fn vfind(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 2) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VFindQuery::new(
        ctx,
        args[0].clone(),
        args[1].clone(),
        limits,
    ));
    Outcome::Continue
}

fn vkeys(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VKeysQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}

fn vrepeats(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VRepeatsQuery::new(ctx, args[0].clone(), args[1].clone()));
    Outcome::Continue
}

fn vavg(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VAvgQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vhigh(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VHighQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vlow(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VLowQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vsum(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VSumQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vback(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server.flusher.submit(VBackQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn vfront(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(VFrontQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}
