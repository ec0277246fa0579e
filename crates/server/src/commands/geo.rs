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

//! Commands related to geographic points: GEOADD, GEOGET, GEODEL, GFIND.

use super::{CommandDef, MUST_BE_NUMERIC, Outcome, Session, def, parse_limits, query_ctx};
use crate::server::Server;
use beryl_common::{Numeric, is_number};
use beryl_db::query::geo::{
    GFindQuery, GeoAddQuery, GeoDelQuery, GeoGetQuery, valid_latitude, valid_longitude,
};

const INVALID_COORD: &str = "Invalid coordinate.";

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("GEOADD", 'g', "<name> <latitude> <longitude>", 3, 3, geoadd),
        def("GEOGET", 'g', "<name>", 1, 1, geoget),
        def("GEODEL", 'g', "<name>", 1, 1, geodel),
        def("GFIND", 'g', "<%name> <offset> <limit>", 1, 3, gfind),
    ]
}

fn geoadd(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    if !is_number(&args[1], true) || !is_number(&args[2], true) {
        session.user.send(Numeric::ErrUse, MUST_BE_NUMERIC);
        return Outcome::Continue;
    }
    let latitude: f64 = args[1].parse().unwrap_or(f64::NAN);
    let longitude: f64 = args[2].parse().unwrap_or(f64::NAN);
    if !valid_latitude(latitude) || !valid_longitude(longitude) {
        session.user.send(Numeric::ErrUse, INVALID_COORD);
        return Outcome::Continue;
    }
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GeoAddQuery::new(ctx, args[0].clone(), latitude, longitude));
    Outcome::Continue
}

fn geoget(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GeoGetQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn geodel(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GeoDelQuery::new(ctx, args[0].clone()));
    Outcome::Continue
}

fn gfind(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let Some(limits) = parse_limits(&session.user, args, 1) else {
        return Outcome::Continue;
    };
    let Some(ctx) = query_ctx(session) else {
        return Outcome::Continue;
    };
    server
        .flusher
        .submit(GFindQuery::new(ctx, args[0].clone(), limits));
    Outcome::Continue
}
