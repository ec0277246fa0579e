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

//! Session establishment: AGENT names the connection, AUTH authenticates it,
//! QUIT ends it.

use super::{CommandDef, Outcome, Session};
use crate::auth;
use crate::server::Server;
use beryl_common::{Numeric, PROCESS_OK};

fn pre_auth(
    name: &'static str,
    syntax: &'static str,
    min_args: usize,
    max_args: usize,
    handler: super::Handler,
) -> CommandDef {
    CommandDef {
        name,
        group: 's',
        syntax,
        min_args,
        max_args,
        pre_auth: true,
        requires: None,
        handler,
    }
}

pub fn defs() -> Vec<CommandDef> {
    vec![
        pre_auth("AGENT", "<instance>", 1, 1, agent),
        pre_auth("AUTH", "<login> <password>", 2, 2, auth_cmd),
        pre_auth("QUIT", "", 0, 0, quit),
    ]
}

fn valid_instance(name: &str) -> bool {
    (3..=15).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn agent(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let wanted = &args[0];
    if !valid_instance(wanted) {
        session.user.send(Numeric::ErrInput, "Invalid instance name.");
        return Outcome::Continue;
    }
    if server.clients.rename(&session.user.instance(), wanted) {
        session.user.send(Numeric::Agent, PROCESS_OK);
    } else {
        session
            .user
            .send(Numeric::ErrInput, "Instance name already in use.");
    }
    Outcome::Continue
}

fn auth_cmd(server: &Server, session: &mut Session, args: &[String]) -> Outcome {
    let (login, password) = (&args[0], &args[1]);
    if !auth::verify(&server.core, &server.logins, login, password) {
        session.user.send(Numeric::ErrLogin, "Invalid credentials.");
        return Outcome::Continue;
    }
    session.authed = true;
    session.login = Some(login.clone());
    session.flags = auth::flags(&server.core, login);
    session.user.send(Numeric::Login, PROCESS_OK);
    Outcome::Continue
}

fn quit(_server: &Server, session: &mut Session, _args: &[String]) -> Outcome {
    session.user.send(Numeric::Ok, "Goodbye.");
    Outcome::Quit
}
