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

//! Monitor administration: start observing the command stream, reset the
//! registry, list the observers.

use super::{CommandDef, Outcome, Session};
use crate::monitor::MonitorLevel;
use crate::server::Server;
use beryl_common::{Numeric, PROCESS_OK};

fn admin(
    name: &'static str,
    syntax: &'static str,
    max_args: usize,
    handler: super::Handler,
) -> CommandDef {
    CommandDef {
        name,
        group: 'o',
        syntax,
        min_args: 0,
        max_args,
        pre_auth: false,
        requires: Some('m'),
        handler,
    }
}

pub fn defs() -> Vec<CommandDef> {
    vec![
        admin("MONITOR", "<level>", 1, monitor),
        admin("MRESET", "", 0, mreset),
        admin("MONITORLIST", "<*argument>", 1, monitorlist),
    ]
}

fn monitor(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    // Re-issuing MONITOR changes level rather than stacking entries.
    server.monitors.remove(&session.user.instance());
    let level = match args.first() {
        Some(arg) => match MonitorLevel::parse(arg) {
            Some(level) => level,
            None => {
                session
                    .user
                    .send(Numeric::ErrInput, format!("Invalid monitor level: {arg}"));
                return Outcome::Continue;
            }
        },
        None => MonitorLevel::Default,
    };
    server.monitors.add(session.user.clone(), level);
    session.user.send(Numeric::Ok, PROCESS_OK);
    Outcome::Continue
}

fn mreset(server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    server.monitors.reset();
    session.user.send(Numeric::Ok, PROCESS_OK);
    Outcome::Continue
}

fn monitorlist(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let filter = match args.first() {
        Some(arg) => match MonitorLevel::parse(arg) {
            Some(level) => Some(level),
            None => {
                session
                    .user
                    .send(Numeric::ErrInput, format!("Invalid monitor level: {arg}"));
                return Outcome::Continue;
            }
        },
        None => None,
    };
    session.user.send(Numeric::StartList, "BEGIN");
    for (instance, level) in server.monitors.list() {
        if filter.is_some_and(|f| f != level) {
            continue;
        }
        session
            .user
            .send(Numeric::ItemList, format!("{instance} {}", level.as_str()));
    }
    session.user.send(Numeric::EndList, "END");
    Outcome::Continue
}
