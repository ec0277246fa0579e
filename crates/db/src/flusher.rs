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

//! The flusher: a fixed pool of worker threads executing query `run()` off
//! the event loop. Inbound is multi-producer (sessions and timer sweeps),
//! outbound is drained by the single dispatcher. Workers never touch users
//! or sockets; their only side effects are store operations, timer-index
//! calls, and attaching partial results.

use crate::expires::{ExpireIndex, FutureIndex};
use crate::query::{Query, RunEnv, Submitted};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::info;

pub struct Flusher {
    inbound_tx: flume::Sender<Submitted>,
    inbound_rx: flume::Receiver<Submitted>,
    results_tx: flume::Sender<Submitted>,
    results_rx: flume::Receiver<Submitted>,
    expires: Arc<ExpireIndex>,
    futures: Arc<FutureIndex>,
    paused: Arc<AtomicBool>,
    kill_switch: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Flusher {
    pub fn new(expires: Arc<ExpireIndex>, futures: Arc<FutureIndex>) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = flume::unbounded();
        let (results_tx, results_rx) = flume::unbounded();
        Arc::new(Self {
            inbound_tx,
            inbound_rx,
            results_tx,
            results_rx,
            expires,
            futures,
            // Queries are held until the server finishes startup and resumes.
            paused: Arc::new(AtomicBool::new(true)),
            kill_switch: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the worker pool. `threads` is clamped to at least one.
    pub fn start(self: &Arc<Self>, threads: usize) {
        let threads = threads.max(1);
        let mut workers = self.workers.lock().unwrap();
        for n in 0..threads {
            let inbound = self.inbound_rx.clone();
            let env = RunEnv::new(
                self.expires.clone(),
                self.futures.clone(),
                self.paused.clone(),
                self.results_tx.clone(),
            );
            let paused = self.paused.clone();
            let kill_switch = self.kill_switch.clone();
            let results = self.results_tx.clone();
            let tb = std::thread::Builder::new().name(format!("beryl-flush-{n}"));
            let jh = tb
                .spawn(move || {
                    loop {
                        if kill_switch.load(Ordering::SeqCst) {
                            break;
                        }
                        // Paused workers stop picking new items; anything
                        // already running observes the flag through its
                        // iterator checks.
                        if paused.load(Ordering::SeqCst) {
                            std::thread::sleep(Duration::from_millis(5));
                            continue;
                        }
                        match inbound.recv_timeout(Duration::from_millis(5)) {
                            Ok(mut submitted) => {
                                submitted.error = submitted.query.run(&env).err();
                                if results.send(submitted).is_err() {
                                    break;
                                }
                            }
                            Err(flume::RecvTimeoutError::Timeout) => continue,
                            Err(flume::RecvTimeoutError::Disconnected) => break,
                        }
                    }
                })
                .expect("failed to spawn flusher worker");
            workers.push(jh);
        }
        info!("Flusher running with {} worker(s)", threads);
    }

    pub fn submit(&self, query: Box<dyn Query>) {
        let _ = self.inbound_tx.send(Submitted::new(query));
    }

    /// The outbound side, consumed by the dispatcher.
    pub fn results(&self) -> flume::Receiver<Submitted> {
        self.results_rx.clone()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// False while paused.
    pub fn is_active(&self) -> bool {
        !self.paused.load(Ordering::SeqCst)
    }

    /// Drop everything queued in both directions and wipe all pending
    /// timers. Used on shutdown and on admin reset.
    pub fn reset_all(&self) {
        while self.inbound_rx.try_recv().is_ok() {}
        while self.results_rx.try_recv().is_ok() {}
        self.expires.reset();
        self.futures.reset();
    }

    /// Stop the pool and join the workers.
    pub fn stop(&self) {
        self.kill_switch.store(true, Ordering::SeqCst);
        let mut workers = self.workers.lock().unwrap();
        for jh in workers.drain(..) {
            let _ = jh.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::User;
    use crate::database::Database;
    use crate::query::QueryCtx;
    use crate::query::keys::{GetQuery, SetQuery};

    fn harness() -> (tempfile::TempDir, Arc<Database>, Arc<Flusher>) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open("t", dir.path()).unwrap();
        let flusher = Flusher::new(Arc::default(), Arc::default());
        flusher.start(2);
        flusher.resume();
        (dir, db, flusher)
    }

    #[test]
    fn runs_submitted_queries() {
        let (_dir, db, flusher) = harness();
        let (user, _frames) = User::new("test");
        user.set_database(db.clone());

        let ctx = QueryCtx::for_user(&user, db.clone());
        flusher.submit(SetQuery::new(ctx, "k".into(), "v".into()));
        let done = flusher
            .results()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert!(done.error.is_none());

        let ctx = QueryCtx::for_user(&user, db.clone());
        flusher.submit(GetQuery::new(ctx, "k".into()));
        let done = flusher
            .results()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert!(done.error.is_none());
        flusher.stop();
    }

    // Workers poll the pause flag between picks; give any in-flight pick
    // time to land before asserting on pause behavior.
    fn settle() {
        std::thread::sleep(Duration::from_millis(50));
    }

    #[test]
    fn paused_pool_holds_queries() {
        let (_dir, db, flusher) = harness();
        flusher.pause();
        settle();
        let (user, _frames) = User::new("test");
        let ctx = QueryCtx::for_user(&user, db.clone());
        flusher.submit(SetQuery::new(ctx, "k".into(), "v".into()));
        assert!(
            flusher
                .results()
                .recv_timeout(Duration::from_millis(100))
                .is_err()
        );
        flusher.resume();
        assert!(
            flusher
                .results()
                .recv_timeout(Duration::from_secs(5))
                .is_ok()
        );
        flusher.stop();
    }

    #[test]
    fn reset_all_drops_queued_work() {
        let (_dir, db, flusher) = harness();
        flusher.pause();
        settle();
        let (user, _frames) = User::new("test");
        let ctx = QueryCtx::for_user(&user, db.clone());
        flusher.submit(SetQuery::new(ctx, "k".into(), "v".into()));
        flusher.reset_all();
        flusher.resume();
        assert!(
            flusher
                .results()
                .recv_timeout(Duration::from_millis(200))
                .is_err()
        );
        flusher.stop();
    }
}
