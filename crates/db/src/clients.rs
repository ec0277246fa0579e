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

//! The user handle the core consumes: a current database, a current select,
//! a quitting flag, and a frame sink drained by the connection's writer. The
//! dispatcher is the only component that writes query output through it.

use crate::database::Database;
use beryl_common::{DEFAULT_SELECT, Frame, Numeric};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct User {
    instance: Mutex<String>,
    select: Mutex<String>,
    database: Mutex<Option<Arc<Database>>>,
    sender: flume::Sender<Frame>,
    quitting: AtomicBool,
}

impl User {
    /// Create a user handle plus the receiving end of its frame sink.
    pub fn new(instance: &str) -> (Arc<Self>, flume::Receiver<Frame>) {
        let (tx, rx) = flume::unbounded();
        let user = Arc::new(Self {
            instance: Mutex::new(instance.to_string()),
            select: Mutex::new(DEFAULT_SELECT.to_string()),
            database: Mutex::new(None),
            sender: tx,
            quitting: AtomicBool::new(false),
        });
        (user, rx)
    }

    /// Queue one reply frame. Frames to a disconnected user are dropped.
    pub fn send(&self, numeric: Numeric, payload: impl Into<String>) {
        let _ = self.sender.send(Frame::new(numeric, payload));
    }

    pub fn instance(&self) -> String {
        self.instance.lock().unwrap().clone()
    }

    pub fn set_instance(&self, instance: &str) {
        *self.instance.lock().unwrap() = instance.to_string();
    }

    pub fn select(&self) -> String {
        self.select.lock().unwrap().clone()
    }

    pub fn set_select(&self, select: &str) {
        *self.select.lock().unwrap() = select.to_string();
    }

    pub fn database(&self) -> Option<Arc<Database>> {
        self.database.lock().unwrap().clone()
    }

    pub fn set_database(&self, database: Arc<Database>) {
        *self.database.lock().unwrap() = Some(database);
    }

    pub fn set_quitting(&self) {
        self.quitting.store(true, Ordering::SeqCst);
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_flow_to_receiver() {
        let (user, rx) = User::new("test");
        user.send(Numeric::Ok, "hello");
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.to_string(), "200 hello");
    }

    #[test]
    fn send_after_disconnect_is_dropped() {
        let (user, rx) = User::new("test");
        drop(rx);
        user.send(Numeric::Ok, "hello");
        assert!(!user.is_quitting());
    }
}
