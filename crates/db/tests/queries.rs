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

//! End-to-end query pipeline tests: submit through the flusher, drain the
//! dispatcher, observe the frames a client would see.

use beryl_common::{Frame, Numeric};
use beryl_db::query::keys::{DelQuery, GetQuery, KeysQuery, SetQuery};
use beryl_db::query::maps::{HCountQuery, HDelQuery, HGetAllQuery, HSetQuery};
use beryl_db::query::vectors::{VCountQuery, VDelQuery, VPushQuery, VSumQuery};
use beryl_db::{
    Database, DbManager, ExpireIndex, Flusher, FutureIndex, Limits, QueryCtx, User, dispatch_one,
    now_secs,
};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    _dir: tempfile::TempDir,
    db: Arc<Database>,
    flusher: Arc<Flusher>,
    expires: Arc<ExpireIndex>,
    futures: Arc<FutureIndex>,
    user: Arc<User>,
    frames: flume::Receiver<Frame>,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = DbManager::new(dir.path());
        let db = manager.load("default").unwrap();
        let expires = Arc::new(ExpireIndex::default());
        let futures = Arc::new(FutureIndex::default());
        let flusher = Flusher::new(expires.clone(), futures.clone());
        flusher.start(2);
        flusher.resume();

        let results = flusher.results();
        std::thread::spawn(move || {
            for submitted in results.iter() {
                dispatch_one(submitted);
            }
        });

        let (user, frames) = User::new("tester");
        user.set_database(db.clone());
        Self {
            _dir: dir,
            db,
            flusher,
            expires,
            futures,
            user,
            frames,
        }
    }

    fn ctx(&self) -> QueryCtx {
        QueryCtx::for_user(&self.user, self.db.clone())
    }

    fn frame(&self) -> Frame {
        self.frames
            .recv_timeout(Duration::from_secs(5))
            .expect("no frame within timeout")
    }

    fn set(&self, key: &str, value: &str) {
        self.flusher
            .submit(SetQuery::new(self.ctx(), key.into(), value.into()));
        assert_eq!(self.frame().numeric, Numeric::QueryOk);
    }

    /// Read one whole bracketed list off the frame channel.
    fn read_list(&self) -> Vec<Frame> {
        let mut items = Vec::new();
        let first = self.frame();
        assert_eq!(first.numeric, Numeric::StartList, "expected list start");
        loop {
            let frame = self.frame();
            if frame.numeric == Numeric::EndList {
                return items;
            }
            items.push(frame);
        }
    }
}

#[test]
fn set_get_del_cycle() {
    let h = Harness::new();

    h.set("foo", "bar");

    h.flusher.submit(GetQuery::new(h.ctx(), "foo".into()));
    let frame = h.frame();
    assert_eq!(frame.numeric, Numeric::Ok);
    assert_eq!(frame.payload, "\"bar\"");

    h.flusher.submit(DelQuery::new(h.ctx(), "foo".into()));
    assert_eq!(h.frame().numeric, Numeric::QueryOk);

    h.flusher.submit(GetQuery::new(h.ctx(), "foo".into()));
    assert_eq!(h.frame().numeric, Numeric::NotFound);

    // Deleting again reports not-found and disturbs nothing else.
    h.flusher.submit(DelQuery::new(h.ctx(), "foo".into()));
    assert_eq!(h.frame().numeric, Numeric::NotFound);
}

#[test]
fn map_stream_brackets_and_pairs() {
    let h = Harness::new();

    h.flusher
        .submit(HSetQuery::new(h.ctx(), "h".into(), "f1".into(), "v1".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);
    h.flusher
        .submit(HSetQuery::new(h.ctx(), "h".into(), "f2".into(), "v2".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);

    h.flusher
        .submit(HGetAllQuery::new(h.ctx(), "h".into(), Limits::default()));
    let items = h.read_list();
    let payloads: Vec<_> = items.iter().map(|f| f.payload.as_str()).collect();
    assert_eq!(payloads, vec!["f1 \"v1\"", "f2 \"v2\""]);
    assert!(items.iter().all(|f| f.numeric == Numeric::ItemList));
}

#[test]
fn vector_sum_and_numeric_guard() {
    let h = Harness::new();

    for v in ["1", "2", "3"] {
        h.flusher
            .submit(VPushQuery::new(h.ctx(), "v".into(), v.into()));
        assert_eq!(h.frame().numeric, Numeric::Ok);
    }
    h.flusher.submit(VSumQuery::new(h.ctx(), "v".into()));
    let frame = h.frame();
    assert_eq!(frame.numeric, Numeric::Ok);
    assert_eq!(frame.payload, "6");

    h.flusher
        .submit(VPushQuery::new(h.ctx(), "v".into(), "abc".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);
    h.flusher.submit(VSumQuery::new(h.ctx(), "v".into()));
    assert_eq!(h.frame().numeric, Numeric::InvalidRange);
}

#[test]
fn keys_scan_streams_in_chunks() {
    let h = Harness::new();

    for i in 0..250 {
        h.set(&format!("k{i:03}"), "x");
    }
    // A prefix the scan must not leak into the answer.
    h.set("other", "x");

    h.flusher.submit(KeysQuery::new(
        h.ctx(),
        "k*".into(),
        Limits::default(),
    ));
    let items = h.read_list();
    assert_eq!(items.len(), 250);
    assert!(items.iter().all(|f| f.numeric == Numeric::Item));
    assert!(items.iter().all(|f| f.payload.starts_with('k')));
}

#[test]
fn pagination_window_matches_full_scan_tail() {
    let h = Harness::new();

    for i in 0..40 {
        h.set(&format!("p{i:02}"), "x");
    }

    h.flusher
        .submit(KeysQuery::new(h.ctx(), "p*".into(), Limits::default()));
    let full: Vec<String> = h.read_list().into_iter().map(|f| f.payload).collect();
    assert_eq!(full.len(), 40);

    let window = Limits {
        offset: 10,
        limit: 15,
    };
    h.flusher
        .submit(KeysQuery::new(h.ctx(), "p*".into(), window));
    let paged: Vec<String> = h.read_list().into_iter().map(|f| f.payload).collect();
    assert_eq!(paged, full[10..25].to_vec());
}

#[test]
fn empty_collections_collapse() {
    let h = Harness::new();

    h.flusher
        .submit(HSetQuery::new(h.ctx(), "m".into(), "f".into(), "v".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);
    h.flusher
        .submit(HDelQuery::new(h.ctx(), "m".into(), "f".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);
    h.flusher.submit(HCountQuery::new(h.ctx(), "m".into()));
    assert_eq!(h.frame().numeric, Numeric::NotFound);

    h.flusher
        .submit(VPushQuery::new(h.ctx(), "v".into(), "x".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);
    h.flusher
        .submit(VDelQuery::new(h.ctx(), "v".into(), "x".into()));
    assert_eq!(h.frame().numeric, Numeric::Ok);
    h.flusher.submit(VCountQuery::new(h.ctx(), "v".into()));
    assert_eq!(h.frame().numeric, Numeric::NotFound);
}

#[test]
fn expire_fires_and_clears_its_entry() {
    let h = Harness::new();

    h.set("doomed", "v");
    let now = now_secs();
    h.expires.add(h.db.clone(), "1", "doomed", 1, false, now);
    assert!(h.expires.trigger_time("default", "1", "doomed").is_some());

    h.expires.flush(now + 2, &h.flusher);
    // The synthesized delete answers no user; poll until it lands.
    wait_until(|| {
        h.flusher.submit(GetQuery::new(h.ctx(), "doomed".into()));
        h.frame().numeric == Numeric::NotFound
    });
    assert_eq!(h.expires.trigger_time("default", "1", "doomed"), None);
}

#[test]
fn future_fires_its_bound_write() {
    let h = Harness::new();

    let now = now_secs();
    h.futures
        .add(h.db.clone(), "1", "later", 1, false, now, "hello".into());
    h.futures.flush(now + 2, &h.flusher);

    wait_until(|| {
        h.flusher.submit(GetQuery::new(h.ctx(), "later".into()));
        let frame = h.frame();
        frame.numeric == Numeric::Ok && frame.payload == "\"hello\""
    });
    assert!(h.futures.entries().is_empty());
}

#[test]
fn closing_database_interrupts_scans() {
    let h = Harness::new();

    h.set("k1", "v");
    h.db.set_closing();
    h.flusher
        .submit(KeysQuery::new(h.ctx(), "*".into(), Limits::default()));
    assert_eq!(h.frame().numeric, Numeric::Interrupt);
}

fn wait_until(mut probe: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if probe() {
            return;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "condition not reached within timeout"
        );
        std::thread::sleep(Duration::from_millis(20));
    }
}
