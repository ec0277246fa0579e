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

//! Introspection: module listings. This build has no dynamic module loader,
//! so MODULES is always empty and COREMODULES lists the built-in command
//! groups.

use super::{CommandDef, Outcome, Session, def};
use crate::server::Server;
use beryl_common::Numeric;

const CORE_MODULES: &[&str] = &[
    "core_keys",
    "core_maps",
    "core_multimaps",
    "core_vectors",
    "core_geo",
    "core_expires",
    "core_futures",
    "core_dbmanager",
    "core_monitor",
    "core_info",
];

pub fn defs() -> Vec<CommandDef> {
    vec![
        def("MODULES", 'i', "", 0, 0, modules),
        def("COREMODULES", 'i', "", 0, 0, coremodules),
    ]
}

fn modules(_server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    session.user.send(Numeric::StartList, "BEGIN");
    session.user.send(Numeric::EndList, "END");
    Outcome::Continue
}

fn coremodules(_server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    session.user.send(Numeric::StartList, "BEGIN");
    for module in CORE_MODULES {
        session.user.send(Numeric::ItemList, *module);
    }
    session.user.send(Numeric::EndList, "END");
    Outcome::Continue
}
