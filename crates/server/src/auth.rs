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

//! Authentication against the core database: bcrypt-hashed passwords in the
//! `pass` map, user metadata in `userlogin`/`created`/`flags`. Verified
//! logins are cached in memory; the cache is wiped hourly and on password
//! change.

use beryl_db::{CoreDb, StoreError, now_secs};
use pwhash::bcrypt;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// Name and password every fresh instance starts with. Operators are
/// expected to change it.
pub const DEFAULT_USER: &str = "root";
const DEFAULT_PASS: &str = "default";

pub struct LoginCache {
    verified: Mutex<HashMap<String, String>>,
}

impl LoginCache {
    pub fn new() -> Self {
        Self {
            verified: Mutex::new(HashMap::new()),
        }
    }

    /// `Some(true)` for a known-good pair, `Some(false)` for a known-bad
    /// password on a cached user, `None` for a cache miss.
    fn check(&self, user: &str, pass: &str) -> Option<bool> {
        let verified = self.verified.lock().unwrap();
        verified.get(user).map(|cached| cached == pass)
    }

    fn add(&self, user: &str, pass: &str) {
        self.verified
            .lock()
            .unwrap()
            .insert(user.to_string(), pass.to_string());
    }

    pub fn remove(&self, user: &str) {
        self.verified.lock().unwrap().remove(user);
    }

    pub fn reset(&self) {
        self.verified.lock().unwrap().clear();
    }
}

/// First-run provisioning: the root user and its created stamp.
pub fn check_defaults(core: &CoreDb) -> Result<(), StoreError> {
    if core.map_get("userlogin", DEFAULT_USER)?.is_some() {
        return Ok(());
    }
    info!("First run: creating default '{DEFAULT_USER}' user.");
    let hashed = bcrypt::hash(DEFAULT_PASS)
        .map_err(|e| StoreError::Storage(format!("unable to hash default password: {e}")))?;
    core.map_set("userlogin", DEFAULT_USER, DEFAULT_USER)?;
    core.map_set("pass", DEFAULT_USER, &hashed)?;
    core.map_set("created", DEFAULT_USER, &now_secs().to_string())?;
    core.map_set("flags", DEFAULT_USER, "r")?;
    Ok(())
}

/// Verify a login attempt. Bcrypt only runs on cache misses.
pub fn verify(core: &CoreDb, cache: &LoginCache, user: &str, pass: &str) -> bool {
    if let Some(hit) = cache.check(user, pass) {
        return hit;
    }
    let Ok(Some(stored)) = core.map_get("pass", user) else {
        return false;
    };
    if !bcrypt::verify(pass, &stored) {
        return false;
    }
    cache.add(user, pass);
    true
}

/// ACL flags for a user; empty when none are set.
pub fn flags(core: &CoreDb, user: &str) -> String {
    core.map_get("flags", user).ok().flatten().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let core = CoreDb::open(dir.path()).unwrap();
        let cache = LoginCache::new();
        check_defaults(&core).unwrap();
        // Provisioning is idempotent.
        check_defaults(&core).unwrap();

        assert!(verify(&core, &cache, DEFAULT_USER, "default"));
        // Second attempt hits the cache.
        assert!(verify(&core, &cache, DEFAULT_USER, "default"));
        assert!(!verify(&core, &cache, DEFAULT_USER, "wrong"));
        assert!(!verify(&core, &cache, "nobody", "default"));
        assert_eq!(flags(&core, DEFAULT_USER), "r");

        cache.reset();
        assert!(verify(&core, &cache, DEFAULT_USER, "default"));
    }
}
