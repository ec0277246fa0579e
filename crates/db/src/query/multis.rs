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

//! Multimap queries. Unlike maps, fields may repeat; MSEEK searches fields
//! by their value.

use super::{Limits, Query, QueryCtx, RunEnv, StreamChunk, Streamer, load, match_entry, save};
use crate::clients::User;
use crate::codec::MultiMapHandler;
use crate::error::QueryError;
use crate::keys::EntryType;
use beryl_common::{Numeric, PROCESS_OK};
use std::sync::Arc;

pub struct MSetQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
    value: String,
}

impl MSetQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            field,
            value,
        })
    }
}

impl Query for MSetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.field.is_empty() || self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let mut handler = load::<MultiMapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        handler.add(&self.field, &self.value);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

/// Streamed field names of one multimap, duplicates included.
pub struct MGetQuery {
    ctx: QueryCtx,
    key: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl MGetQuery {
    pub fn new(ctx: QueryCtx, key: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            limits,
            stream: None,
        })
    }
}

impl Query for MGetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler =
            load::<MultiMapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
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

/// Remove every entry under one field.
pub struct MDelQuery {
    ctx: QueryCtx,
    key: String,
    field: String,
}

impl MDelQuery {
    pub fn new(ctx: QueryCtx, key: String, field: String) -> Box<Self> {
        Box::new(Self { ctx, key, field })
    }
}

impl Query for MDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler =
            load::<MultiMapHandler>(&self.ctx, &self.key)?.ok_or(QueryError::NotFound)?;
        handler.remove(&self.field);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

/// Scan for multimap-typed keys matching a pattern.
pub struct MKeysQuery {
    ctx: QueryCtx,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl MKeysQuery {
    pub fn new(ctx: QueryCtx, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for MKeysQuery {
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
            let Some(decoded) =
                match_entry(&self.ctx, EntryType::MultiMap, &self.pattern, &physical)
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

/// Streamed fields whose value matches the given pattern.
pub struct MSeekQuery {
    ctx: QueryCtx,
    key: String,
    value_pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl MSeekQuery {
    pub fn new(ctx: QueryCtx, key: String, value_pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            value_pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for MSeekQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler = load::<MultiMapHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        let mut streamer = Streamer::new(env, &self.ctx, self.limits, false);
        for field in handler.find(&self.value_pattern) {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            if !streamer.push(field) {
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
