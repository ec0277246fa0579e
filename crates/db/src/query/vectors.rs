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

//! Vector queries. Numeric aggregates demand a fully numeric vector and fail
//! with an invalid-range error otherwise, computing nothing partially.

use super::{Limits, Query, QueryCtx, RunEnv, StreamChunk, Streamer, load, match_entry, save};
use crate::clients::User;
use crate::codec::VectorHandler;
use crate::error::QueryError;
use crate::keys::EntryType;
use beryl_common::{Numeric, PROCESS_OK, quote_str};
use std::sync::Arc;

/// Render an aggregate without a trailing `.0` when it lands on an integer.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn load_required(ctx: &QueryCtx, key: &str) -> Result<VectorHandler, QueryError> {
    load::<VectorHandler>(ctx, key)?.ok_or(QueryError::NotFound)
}

fn load_numeric(ctx: &QueryCtx, key: &str) -> Result<VectorHandler, QueryError> {
    let handler = load_required(ctx, key)?;
    if !handler.is_numeric() {
        return Err(QueryError::InvalidRange);
    }
    Ok(handler)
}

pub struct VPushQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
}

impl VPushQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self { ctx, key, value })
    }
}

impl Query for VPushQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let mut handler = load::<VectorHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        handler.add(&self.value);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct VPushNxQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
}

impl VPushNxQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self { ctx, key, value })
    }
}

impl Query for VPushNxQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if self.value.is_empty() {
            return Err(QueryError::MissArgs);
        }
        let mut handler = load::<VectorHandler>(&self.ctx, &self.key)?.unwrap_or_default();
        if handler.exist(&self.value) {
            return Err(QueryError::EntryExists);
        }
        handler.add(&self.value);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

/// Streamed elements of one vector.
pub struct VGetQuery {
    ctx: QueryCtx,
    key: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl VGetQuery {
    pub fn new(ctx: QueryCtx, key: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            limits,
            stream: None,
        })
    }
}

impl Query for VGetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        let mut streamer = Streamer::new(env, &self.ctx, self.limits, true);
        for element in handler.elements() {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            if !streamer.push(element.to_string()) {
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

pub struct VPopFrontQuery {
    ctx: QueryCtx,
    key: String,
}

impl VPopFrontQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self { ctx, key })
    }
}

impl Query for VPopFrontQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load_required(&self.ctx, &self.key)?;
        handler.pop_front();
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct VPopBackQuery {
    ctx: QueryCtx,
    key: String,
}

impl VPopBackQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self { ctx, key })
    }
}

impl Query for VPopBackQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load_required(&self.ctx, &self.key)?;
        handler.pop_back();
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

/// Remove the first element equal to the given value.
pub struct VDelQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
}

impl VDelQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self { ctx, key, value })
    }
}

impl Query for VDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load_required(&self.ctx, &self.key)?;
        if !handler.remove(&self.value) {
            return Err(QueryError::NotFound);
        }
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct VCountQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VCountQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VCountQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        self.response = handler.count().to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

/// Element at a position.
pub struct VPosQuery {
    ctx: QueryCtx,
    key: String,
    position: usize,
    response: String,
}

impl VPosQuery {
    pub fn new(ctx: QueryCtx, key: String, position: usize) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            position,
            response: String::new(),
        })
    }
}

impl Query for VPosQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        self.response = handler
            .index(self.position)
            .ok_or(QueryError::NotFound)?
            .to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

pub struct VExistQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
    response: String,
}

impl VExistQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            value,
            response: String::new(),
        })
    }
}

impl Query for VExistQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        self.response = if handler.exist(&self.value) { "1" } else { "0" }.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct VSortQuery {
    ctx: QueryCtx,
    key: String,
}

impl VSortQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self { ctx, key })
    }
}

impl Query for VSortQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load_required(&self.ctx, &self.key)?;
        handler.sort();
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct VReverseQuery {
    ctx: QueryCtx,
    key: String,
}

impl VReverseQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self { ctx, key })
    }
}

impl Query for VReverseQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load_required(&self.ctx, &self.key)?;
        handler.reverse();
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

pub struct VResizeQuery {
    ctx: QueryCtx,
    key: String,
    size: usize,
}

impl VResizeQuery {
    pub fn new(ctx: QueryCtx, key: String, size: usize) -> Box<Self> {
        Box::new(Self { ctx, key, size })
    }
}

impl Query for VResizeQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let mut handler = load_required(&self.ctx, &self.key)?;
        handler.resize(self.size);
        save(&self.ctx, &self.key, &handler)
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, PROCESS_OK);
    }
}

/// Streamed elements matching a glob pattern.
pub struct VFindQuery {
    ctx: QueryCtx,
    key: String,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl VFindQuery {
    pub fn new(ctx: QueryCtx, key: String, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for VFindQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        let mut streamer = Streamer::new(env, &self.ctx, self.limits, true);
        for element in handler.find(&self.pattern) {
            if !env.check_iterator(&self.ctx) {
                return Err(QueryError::Interrupt);
            }
            if !streamer.push(element) {
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

/// Scan for vector-typed keys matching a pattern.
pub struct VKeysQuery {
    ctx: QueryCtx,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl VKeysQuery {
    pub fn new(ctx: QueryCtx, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for VKeysQuery {
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
            let Some(decoded) = match_entry(&self.ctx, EntryType::Vector, &self.pattern, &physical)
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

pub struct VRepeatsQuery {
    ctx: QueryCtx,
    key: String,
    value: String,
    response: String,
}

impl VRepeatsQuery {
    pub fn new(ctx: QueryCtx, key: String, value: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            value,
            response: String::new(),
        })
    }
}

impl Query for VRepeatsQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        self.response = handler.repeats(&self.value).to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct VAvgQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VAvgQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VAvgQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_numeric(&self.ctx, &self.key)?;
        self.response = format_number(handler.sma());
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct VHighQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VHighQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VHighQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_numeric(&self.ctx, &self.key)?;
        self.response = format_number(handler.high());
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct VLowQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VLowQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VLowQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_numeric(&self.ctx, &self.key)?;
        self.response = format_number(handler.low());
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct VSumQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VSumQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VSumQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_numeric(&self.ctx, &self.key)?;
        self.response = format_number(handler.sum());
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct VBackQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VBackQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VBackQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        self.response = handler.back().ok_or(QueryError::NotFound)?.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

pub struct VFrontQuery {
    ctx: QueryCtx,
    key: String,
    response: String,
}

impl VFrontQuery {
    pub fn new(ctx: QueryCtx, key: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            key,
            response: String::new(),
        })
    }
}

impl Query for VFrontQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        let handler = load_required(&self.ctx, &self.key)?;
        self.response = handler.front().ok_or(QueryError::NotFound)?.to_string();
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, quote_str(&self.response));
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-1.0), "-1");
    }
}
