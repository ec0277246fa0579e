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

//! Plain-key queries: SET/GET and their variants, plus the full-namespace
//! scans (KEYS, COUNT, SEARCH, WDEL, RKEY) over entries of key type.

use super::{
    Limits, PairStreamer, Query, QueryCtx, RunEnv, StreamChunk, Streamer, match_entry, plain_delete,
    plain_get, plain_put,
};
use crate::clients::User;
use crate::error::QueryError;
use crate::keys::EntryType;
use beryl_common::{Numeric, PROCESS_OK, quote_str};
use rand::Rng;
use std::sync::Arc;

pub struct SetQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
}

impl SetQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self { ctx, key, value })
    }

    /// A future firing: same write, no user to answer.
    pub fn for_timer(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self { ctx, key, value })
    }
}

impl Query for SetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        plain_put(&self.ctx, &self.key, &self.value)
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

pub struct SetNxQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
}

impl SetNxQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self { ctx, key, value })
    }
}

impl Query for SetNxQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        if plain_get(&self.ctx, &self.key)?.is_some() {
            return Err(QueryError::EntryExists);
        }
        plain_put(&self.ctx, &self.key, &self.value)
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

/// SET with an expiry in one round trip.
pub struct SetTxQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
    seconds: i64,
}

impl SetTxQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String, seconds: i64) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            value,
            seconds,
        })
    }
}

impl Query for SetTxQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        plain_put(&self.ctx, &self.key, &self.value)?;
        env.expires.add(
            self.ctx.database.clone(),
            &self.ctx.select,
            &self.key,
            self.seconds,
            false,
            crate::now_secs(),
        );
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

pub struct GetQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl GetQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for GetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        self.response = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

pub struct GetDelQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl GetDelQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for GetDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        self.response = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        plain_delete(&self.ctx, &self.key)?;
        env.expires
            .delete(self.ctx.database.name(), &self.ctx.select, &self.key);
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

pub struct GetSetQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
    response: String,
}

impl GetSetQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            value,
            response: String::new(),
        })
    }
}

impl Query for GetSetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        self.response = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        plain_put(&self.ctx, &self.key, &self.value)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

/// Character range `[from..=to]`, zero-based, of a stored value.
pub struct GetSubstrQuery {
    ctx: QueryCtx,
    key: String,
    from: usize,
    to: usize,
    response: String,
}

impl GetSubstrQuery {
    pub fn new(ctx: QueryCtx, key: String, from: usize, to: usize) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            from,
            to,
            response: String::new(),
        })
    }
}

impl Query for GetSubstrQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let value = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        if self.from > self.to || self.from >= value.chars().count() {
            return Err(QueryError::InvalidRange);
        }
        self.response = value
            .chars()
            .skip(self.from)
            .take(self.to - self.from + 1)
            .collect();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

/// Number of (non-overlapping) occurrences of a substring in a value.
pub struct GetOccursQuery {
    ctx: QueryCtx,
    key: String,
    needle: String,
    response: String,
}

impl GetOccursQuery {
    pub fn new(ctx: QueryCtx, key: String, needle: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            needle,
            response: String::new(),
        })
    }
}

impl Query for GetOccursQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.needle.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let value = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        self.response = value.matches(self.needle.as_str()).count().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

/// GET plus scheduling an expire on the same key.
pub struct GetExpQuery {
    ctx: QueryCtx,
    key: String,
    seconds: i64,
    response: String,
}

impl GetExpQuery {
    pub fn new(ctx: QueryCtx, key: String, seconds: i64) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            seconds,
            response: String::new(),
        })
    }
}

impl Query for GetExpQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        self.response = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        env.expires.add(
            self.ctx.database.clone(),
            &self.ctx.select,
            &self.key,
            self.seconds,
            false,
            crate::now_secs(),
        );
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

/// GET plus dropping any pending expire on the key.
pub struct GetPersistQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl GetPersistQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for GetPersistQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        self.response = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        env.expires
            .delete(self.ctx.database.name(), &self.ctx.select, &self.key);
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

pub struct StrlenQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl StrlenQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for StrlenQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let value = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        self.response = value.len().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct AppendQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
    response: String,
}

impl AppendQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            value,
            response: String::new(),
        })
    }
}

impl Query for AppendQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let mut stored = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        stored.push_str(&self.value);
        plain_put(&self.ctx, &self.key, &stored)?;
        self.response = stored.len().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, self.response.clone());
    }
}

/// How many of the given keys currently exist.
pub struct TouchQuery {
    ctx: QueryCtx,
    keys: Vec<String>,
    response: String,
}

impl TouchQuery {
    pub fn new(ctx: QueryCtx, keys: Vec<String>) -> Box<Self> {
        Box::new(Self {
            ctx,
            keys,
            response: String::new(),
        })
    }
}

impl Query for TouchQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut found = 0usize;
        for key in &self.keys {
            if plain_get(&self.ctx, key)?.is_some() {
                found += 1;
            }
        }
        self.response = found.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

/// A uniformly random key from the current select.
pub struct RKeyQuery {
    ctx: QueryCtx,
    response: String,
}

impl RKeyQuery {
    pub fn new(ctx: QueryCtx) -> Box<Self> {
        Box::new(Self {
            ctx,
            response: String::new(),
        })
    }
}

impl Query for RKeyQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let mut rng = rand::rng();
        let mut chosen: Option<String> = None;
        let mut seen = 0usize;
        for row in self.ctx.database.store().iter() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            let Ok((physical, _)) = row else { continue };
            let Some(decoded) = match_entry(&self.ctx, EntryType::Key, "*", &physical) else {
                continue;
            };
            seen += 1;
            // Reservoir of one.
            if rng.random_range(0..seen) == 0 {
                chosen = Some(decoded.key);
            }
        }
        self.response = chosen.ok_or(QueryError::NotFound)?;
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct IsAlphaQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl IsAlphaQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for IsAlphaQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let value = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        let alpha = !value.is_empty() && value.chars().all(char::is_alphabetic);
        self.response = if alpha { "1" } else { "0" }.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct IsNumQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl IsNumQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for IsNumQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let value = plain_get(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        let numeric = beryl_common::is_number(&value, true);
        self.response = if numeric { "1" } else { "0" }.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct DelQuery {
    ctx: QueryCtx,
    key: String,
}

impl DelQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self { ctx, key })
    }

    /// An expire firing: same delete, no user to answer.
    pub fn for_timer(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self { ctx, key })
    }
}

impl Query for DelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        if plain_get(&self.ctx, &self.key)?.is_none() {
            return Err(QueryError::NotFound);
        }
        plain_delete(&self.ctx, &self.key)?;
        env.expires
            .delete(self.ctx.database.name(), &self.ctx.select, &self.key);
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

/// Streamed key listing by glob pattern.
pub struct KeysQuery {
    ctx: QueryCtx,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl KeysQuery {
    pub fn new(ctx: QueryCtx, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for KeysQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let mut streamer = Streamer::new(env, &self.ctx, self.limits, false);
        for row in self.ctx.database.store().iter() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            let Ok((physical, _)) = row else { continue };
            let Some(decoded) = match_entry(&self.ctx, EntryType::Key, &self.pattern, &physical)
            else {
                continue;
            };
            if !streamer.push(decoded.key) {
                break;
            }
        }
        self.stream = Some(streamer.finish());
        Ok(())
    }

    fn process(&self) {
        if let Some(chunk) = &self.stream {
            chunk.flush();
        }
    }
}

pub struct CountQuery {
    ctx: QueryCtx,
    pattern: String,
    response: String,
}

impl CountQuery {
    pub fn new(ctx: QueryCtx, pattern: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            response: String::new(),
        })
    }
}

impl Query for CountQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let mut counter = 0usize;
        for row in self.ctx.database.store().iter() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            let Ok((physical, _)) = row else { continue };
            if match_entry(&self.ctx, EntryType::Key, &self.pattern, &physical).is_some() {
                counter += 1;
            }
        }
        self.response = counter.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

/// Streamed (key, value) pairs for keys matching the pattern.
pub struct SearchQuery {
    ctx: QueryCtx,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl SearchQuery {
    pub fn new(ctx: QueryCtx, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for SearchQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let mut streamer = PairStreamer::new(env, &self.ctx, self.limits);
        for row in self.ctx.database.store().iter() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            let Ok((physical, value)) = row else { continue };
            let Some(decoded) = match_entry(&self.ctx, EntryType::Key, &self.pattern, &physical)
            else {
                continue;
            };
            let value = String::from_utf8_lossy(&value).into_owned();
            if !streamer.push(decoded.key, value) {
                break;
            }
        }
        self.stream = Some(streamer.finish());
        Ok(())
    }

    fn process(&self) {
        if let Some(chunk) = &self.stream {
            chunk.flush();
        }
    }
}

/// Wildcard delete: every key matching the pattern goes away, along with any
/// pending expire on it.
pub struct WDelQuery {
    ctx: QueryCtx,
    pattern: String,
    response: String,
}

impl WDelQuery {
    pub fn new(ctx: QueryCtx, pattern: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            response: String::new(),
        })
    }
}

impl Query for WDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let mut victims = Vec::new();
        for row in self.ctx.database.store().iter() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            let Ok((physical, _)) = row else { continue };
            if let Some(decoded) = match_entry(&self.ctx, EntryType::Key, &self.pattern, &physical)
            {
                victims.push(decoded.key);
            }
        }
        for key in &victims {
            plain_delete(&self.ctx, key)?;
            env.expires
                .delete(self.ctx.database.name(), &self.ctx.select, key);
        }
        self.response = victims.len().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, self.response.clone());
    }
}

/// Bytes on disk for the whole database.
pub struct DbSizeQuery {
    ctx: QueryCtx,
    response: String,
}

impl DbSizeQuery {
    pub fn new(ctx: QueryCtx) -> Box<Self> {
        Box::new(Self {
            ctx,
            response: String::new(),
        })
    }
}

impl Query for DbSizeQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        self.response = self.ctx.database.store().disk_space().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}
