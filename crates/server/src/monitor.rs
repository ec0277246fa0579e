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

//! The monitor registry: sessions observing the command stream of everyone
//! else. DEFAULT monitors see data commands; DEBUG monitors see everything.

use beryl_common::Numeric;
use beryl_db::User;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum MonitorLevel {
    Default,
    Debug,
}

impl MonitorLevel {
    pub fn parse(level: &str) -> Option<Self> {
        match level.to_ascii_uppercase().as_str() {
            "DEFAULT" => Some(MonitorLevel::Default),
            "DEBUG" => Some(MonitorLevel::Debug),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorLevel::Default => "DEFAULT",
            MonitorLevel::Debug => "DEBUG",
        }
    }
}

pub struct Monitors {
    watching: Mutex<HashMap<String, (Arc<User>, MonitorLevel)>>,
}

impl Monitors {
    pub fn new() -> Self {
        Self {
            watching: Mutex::new(HashMap::new()),
        }
    }

    /// Register a monitoring session, replacing its previous level.
    pub fn add(&self, user: Arc<User>, level: MonitorLevel) {
        self.watching
            .lock()
            .unwrap()
            .insert(user.instance(), (user, level));
    }

    pub fn remove(&self, instance: &str) {
        self.watching.lock().unwrap().remove(instance);
    }

    pub fn reset(&self) {
        self.watching.lock().unwrap().clear();
    }

    pub fn list(&self) -> Vec<(String, MonitorLevel)> {
        let mut monitors: Vec<_> = self
            .watching
            .lock()
            .unwrap()
            .iter()
            .map(|(instance, (_, level))| (instance.clone(), *level))
            .collect();
        monitors.sort();
        monitors
    }

    /// Echo an executed command line to every monitor except its issuer.
    /// `data_command` limits what DEFAULT-level monitors get to see.
    pub fn broadcast(&self, issuer: &Arc<User>, line: &str, data_command: bool) {
        let issuer_instance = issuer.instance();
        let watching = self.watching.lock().unwrap();
        for (instance, (user, level)) in watching.iter() {
            if *instance == issuer_instance {
                continue;
            }
            if *level == MonitorLevel::Default && !data_command {
                continue;
            }
            user.send(Numeric::Monitor, format!("{issuer_instance} {line}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse() {
        assert_eq!(MonitorLevel::parse("debug"), Some(MonitorLevel::Debug));
        assert_eq!(MonitorLevel::parse("DEFAULT"), Some(MonitorLevel::Default));
        assert_eq!(MonitorLevel::parse("loud"), None);
    }

    #[test]
    fn broadcast_respects_levels_and_self() {
        let monitors = Monitors::new();
        let (watcher, watcher_frames) = User::new("watcher");
        let (debugger, debugger_frames) = User::new("debugger");
        let (issuer, _issuer_frames) = User::new("issuer");
        monitors.add(watcher, MonitorLevel::Default);
        monitors.add(debugger, MonitorLevel::Debug);

        monitors.broadcast(&issuer, "SET k v", true);
        assert!(watcher_frames.try_recv().is_ok());
        assert!(debugger_frames.try_recv().is_ok());

        monitors.broadcast(&issuer, "MONITORLIST", false);
        assert!(watcher_frames.try_recv().is_err());
        assert!(debugger_frames.try_recv().is_ok());
    }
}
