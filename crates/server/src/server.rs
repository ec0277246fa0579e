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

//! The server instance: one struct threading every shared component through
//! the connections, timers and the dispatcher.

use crate::auth::{self, LoginCache};
use crate::config::ServerConfig;
use crate::monitor::Monitors;
use crate::settings::Settings;
use beryl_db::{CoreDb, DbManager, ExpireIndex, Flusher, FutureIndex, User};
use eyre::WrapErr;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct Server {
    pub config: ServerConfig,
    pub manager: DbManager,
    pub core: Arc<CoreDb>,
    pub settings: Settings,
    pub logins: LoginCache,
    pub expires: Arc<ExpireIndex>,
    pub futures: Arc<FutureIndex>,
    pub flusher: Arc<Flusher>,
    pub monitors: Monitors,
    pub clients: Clients,
}

impl Server {
    /// Bring every subsystem up, paused. The caller resumes the flusher once
    /// it is ready to serve.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, eyre::Error> {
        std::fs::create_dir_all(&config.data_dir)
            .wrap_err("Unable to create the data directory")?;

        let core = Arc::new(CoreDb::open(&config.data_dir).wrap_err("Unable to open core database")?);
        auth::check_defaults(&core)?;
        let settings = Settings::new(core.clone())?;
        settings.set_defaults()?;

        let manager = DbManager::new(&config.data_dir);
        let opened = manager.open_all()?;
        info!("{opened} database(s) opened");
        manager
            .load(&config.default_database)
            .wrap_err("Unable to open the default database")?;
        manager.set_default(&config.default_database);

        let expires = Arc::new(ExpireIndex::default());
        let futures = Arc::new(FutureIndex::default());
        let flusher = Flusher::new(expires.clone(), futures.clone());
        flusher.start(config.workers);

        Ok(Arc::new(Self {
            config,
            manager,
            core,
            settings,
            logins: LoginCache::new(),
            expires,
            futures,
            flusher,
            monitors: Monitors::new(),
            clients: Clients::new(),
        }))
    }

    /// One second has passed: fire due expirations and futures.
    pub fn run_timed(&self, now: i64) {
        self.expires.flush(now, &self.flusher);
        self.futures.flush(now, &self.flusher);
        if now % 3600 == 0 {
            self.logins.reset();
        }
    }

    /// Orderly teardown: stop taking queries, drop queued work and timers,
    /// close the stores.
    pub fn shutdown(&self) {
        info!("Preparing exit.");
        self.flusher.pause();
        self.flusher.reset_all();
        self.flusher.stop();
        self.manager.close_all();
        if let Err(e) = self.core.persist() {
            tracing::warn!("Unable to persist core database: {e}");
        }
        info!("Exit finished.");
    }
}

/// Connected sessions by instance name, for USING and the monitor listing.
pub struct Clients {
    by_instance: Mutex<HashMap<String, Arc<User>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self {
            by_instance: Mutex::new(HashMap::new()),
        }
    }

    pub fn add(&self, user: Arc<User>) {
        self.by_instance
            .lock()
            .unwrap()
            .insert(user.instance(), user);
    }

    pub fn remove(&self, instance: &str) {
        self.by_instance.lock().unwrap().remove(instance);
    }

    pub fn find(&self, instance: &str) -> Option<Arc<User>> {
        self.by_instance.lock().unwrap().get(instance).cloned()
    }

    /// Rename a session; refused when the name is taken.
    pub fn rename(&self, old: &str, new: &str) -> bool {
        let mut by_instance = self.by_instance.lock().unwrap();
        if by_instance.contains_key(new) {
            return false;
        }
        let Some(user) = by_instance.remove(old) else {
            return false;
        };
        user.set_instance(new);
        by_instance.insert(new.to_string(), user);
        true
    }
}
