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

//! Geographic point queries. A point is stored under its own entry type as
//! `<latitude> <longitude>`; coordinate validation happens at the command
//! layer, bounds here are the last line of defense.

use super::{Limits, Query, QueryCtx, RunEnv, StreamChunk, Streamer, match_entry};
use crate::clients::User;
use crate::error::QueryError;
use crate::keys::EntryType;
use beryl_common::{Numeric, PROCESS_OK};
use std::sync::Arc;

pub fn valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

pub fn valid_longitude(long: f64) -> bool {
    (-180.0..=180.0).contains(&long)
}

fn geo_get(ctx: &QueryCtx, key: &str) -> Result<Option<String>, QueryError> {
    let dest = ctx.dest(key, EntryType::Geo);
    match ctx.database.store().get(&dest) {
        Ok(Some(bytes)) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| QueryError::InvalidFormat),
        Ok(None) => Ok(None),
        Err(_) => Ok(None),
    }
}

pub struct GeoAddQuery {
    ctx: QueryCtx,
    name: String,
    latitude: f64,
    longitude: f64,
}

impl GeoAddQuery {
    pub fn new(ctx: QueryCtx, name: String, latitude: f64, longitude: f64) -> Box<Self> {
        Box::new(Self {
            ctx,
            name,
            latitude,
            longitude,
        })
    }
}

impl Query for GeoAddQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if !valid_latitude(self.latitude) || !valid_longitude(self.longitude) {
            return Err(QueryError::InvalidCoord);
        }
        let dest = self.ctx.dest(&self.name, EntryType::Geo);
        let value = format!("{} {}", self.latitude, self.longitude);
        self.ctx
            .database
            .store()
            .put(&dest, value.as_bytes())
            .map_err(|_| QueryError::UnableWrite)
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

pub struct GeoGetQuery {
    ctx: QueryCtx,
    name: String,
    response: String,
}

impl GeoGetQuery {
    pub fn new(ctx: QueryCtx, name: String) -> Box<Self> {
        Box::new(Self {
            ctx,
            name,
            response: String::new(),
        })
    }
}

impl Query for GeoGetQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        self.response = geo_get(&self.ctx, &self.name)?.ok_or(QueryError::NotFound)?;
        Ok(())
    }

    fn process(&self) {
        self.ctx.send(Numeric::Ok, self.response.clone());
    }
}

pub struct GeoDelQuery {
    ctx: QueryCtx,
    name: String,
}

impl GeoDelQuery {
    pub fn new(ctx: QueryCtx, name: String) -> Box<Self> {
        Box::new(Self { ctx, name })
    }
}

impl Query for GeoDelQuery {
    fn user(&self) -> Option<&Arc<User>> {
        self.ctx.user.as_ref()
    }

    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        if geo_get(&self.ctx, &self.name)?.is_none() {
            return Err(QueryError::NotFound);
        }
        let dest = self.ctx.dest(&self.name, EntryType::Geo);
        self.ctx
            .database
            .store()
            .delete(&dest)
            .map_err(|_| QueryError::UnableWrite)
    }

    fn process(&self) {
        self.ctx.send(Numeric::QueryOk, PROCESS_OK);
    }
}

/// Scan for geo-typed keys matching a pattern.
pub struct GFindQuery {
    ctx: QueryCtx,
    pattern: String,
    limits: Limits,
    stream: Option<StreamChunk>,
}

impl GFindQuery {
    pub fn new(ctx: QueryCtx, pattern: String, limits: Limits) -> Box<Self> {
        Box::new(Self {
            ctx,
            pattern,
            limits,
            stream: None,
        })
    }
}

impl Query for GFindQuery {
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
            let Some(decoded) = match_entry(&self.ctx, EntryType::Geo, &self.pattern, &physical)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_bounds() {
        assert!(valid_latitude(0.0));
        assert!(valid_latitude(-90.0));
        assert!(valid_latitude(90.0));
        assert!(!valid_latitude(90.5));
        assert!(valid_longitude(-180.0));
        assert!(valid_longitude(180.0));
        assert!(!valid_longitude(181.0));
    }
}
