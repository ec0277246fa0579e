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

//! Map queries. A map lives in one physical row; mutations decode the blob,
//! operate on the handler, and write the whole row back (or drop it once the
//! last field is gone).

use super::{
    Limits, PairStreamer, Query, QueryCtx, RunEnv, StreamChunk, Streamer, load, match_entry, save,
};
use crate::clients::User;
use crate::codec::MapHandler;
use crate::error::QueryError;
use crate::keys::EntryType;
use beryl_common::{Numeric, PROCESS_OK, glob_match, quote_str};
use std::sync::Arc;

pub struct HSetQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
    value: String,
}

impl HSetQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            field,
            value,
        })
    }
}

impl Query for HSetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.field.is_empty() || self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let mut handler = load::<MapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        handler.add(&self.field, &self.value);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct HSetNxQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
    value: String,
}

impl HSetNxQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            field,
            value,
        })
    }
}

impl Query for HSetNxQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.field.is_empty() || self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let mut handler = load::<MapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        if handler.exists(&self.field) {
            return Err(QueryError::EntryExists);
        }
        handler.add(&self.field, &self.value);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct HGetQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
    response: String,
}

impl HGetQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            field,
            response: String::new(),
        })
    }
}

impl Query for HGetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.field.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let handler = load::<MapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        self.response = handler
            .get(&self.field)
            .ok_or(QueryError::NotFound)?
            .to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

pub struct HDelQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
}

impl HDelQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String) -> Box<Self> {
        Box::new(Self { ctx, key, field })
    }
}

impl Query for HDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load::<MapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        if !handler.remove(&self.field) {
            return Err(QueryError::NotFound);
        }
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct HExistsQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
    response: String,
}

impl HExistsQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            field,
            response: String::new(),
        })
    }
}

impl Query for HExistsQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.field.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let exists = load::<MapHandler>(&self.ctx, &self.key)?
            .map(|handler| handler.exists(&self.field))
            .unwrap_or(false);
        self.response = if exists { "1" } else { "0" }.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct HStrlenQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
    response: String,
}

impl HStrlenQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            field,
            response: String::new(),
        })
    }
}

impl Query for HStrlenQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.field.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let handler = load::<MapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        self.response = handler
            .strlen(&self.field)
            .ok_or(QueryError::NotFound)?
            .to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct HCountQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl HCountQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for HCountQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load::<MapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        self.response = handler.count().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

/// Scan for map-typed keys matching a pattern.
pub struct HFindQuery {
    ctx: QueryCtx,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl HFindQuery {
    pub fn new(ctx: QueryCtx, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for HFindQuery {
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
            let Some(decoded) = match_entry(&self.ctx, EntryType::Map, &self.pattern, &physical)
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

/// Streamed field names of one map.
pub struct HListQuery {
    ctx: QueryCtx,
    key: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl HListQuery {
    pub fn new(ctx: QueryCtx, key: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            limits,
            stream: None,
        })
    }
}

impl Query for HListQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler = load::<MapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        let mut streamer = Streamer::new(env, &self.ctx, self.limits, false);
        for field in handler.fields() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            if !streamer.push(field.to_string()) {
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

/// Streamed values of one map.
pub struct HValsQuery {
    ctx: QueryCtx,
    key: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl HValsQuery {
    pub fn new(ctx: QueryCtx, key: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            limits,
            stream: None,
        })
    }
}

impl Query for HValsQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler = load::<MapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        let mut streamer = Streamer::new(env, &self.ctx, self.limits, true);
        for value in handler.values() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            if !streamer.push(value.to_string()) {
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

/// Streamed (field, value) pairs of one map.
pub struct HGetAllQuery {
    ctx: QueryCtx,
    key: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl HGetAllQuery {
    pub fn new(ctx: QueryCtx, key: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            limits,
            stream: None,
        })
    }
}

impl Query for HGetAllQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler = load::<MapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        let mut streamer = PairStreamer::new(env, &self.ctx, self.limits);
        for (field, value) in handler.pairs() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            if !streamer.push(field.to_string(), value.to_string()) {
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

/// Delete every field of one map whose name matches a glob pattern.
pub struct HWDelQuery {
    ctx: QueryCtx,
    key: String,
    pattern: String,
    response: String,
}

impl HWDelQuery {
    pub fn new(ctx: QueryCtx, key: String, pattern: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            pattern,
            response: String::new(),
        })
    }
}

impl Query for HWDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load::<MapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        let victims: Vec<String> = handler
            .fields()
            .filter(|f| glob_match(&self.pattern, f))
            .map(str::to_string)
            .collect();
        for field in &victims {
            handler.remove(field);
        }
        save(&self.ctx, &self.key, &handler)?;
        self.response = victims.len().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, self.response.clone());
    }
}
