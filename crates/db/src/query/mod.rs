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

//! Query objects. Each command becomes one struct implementing [`Query`]:
//! `run` executes on a flusher worker and may touch only the query's database
//! (plus the timer indices, under their locks), `process` executes on the
//! dispatcher and writes reply frames through the user handle. A query is
//! immutable after submission except for the result fields its worker fills
//! in before completing it.

use crate::clients::User;
use crate::codec::{MapHandler, MultiMapHandler, VectorHandler};
use crate::database::{Database, DrainGuard};
use crate::error::QueryError;
use crate::expires::{ExpireIndex, FutureIndex};
use crate::keys::EntryType;
use beryl_common::{Numeric, quote_str};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod geo;
pub mod keys;
pub mod maps;
pub mod multis;
pub mod vectors;

/// Streaming iterators hand off a partial result every this many elements.
pub const ITER_LIMIT: usize = 100;

pub trait Query: Send {
    fn user(&self) -> Option<&Arc<User>>;
    fn run(&mut self, env: &RunEnv) -> Result<(), QueryError>;
    fn process(&self);
}

/// A query plus its terminal state, as carried on both flusher queues.
/// `error` is `None` until the worker completes the run.
pub struct Submitted {
    pub query: Box<dyn Query>,
    pub error: Option<QueryError>,
}

impl Submitted {
    pub fn new(query: Box<dyn Query>) -> Self {
        Self { query, error: None }
    }
}

/// Immutable input snapshot a query carries from construction to completion.
/// Holding it keeps the database's drain count raised.
pub struct QueryCtx {
    pub user: Option<Arc<User>>,
    pub database: Arc<Database>,
    pub select: String,
    _guard: DrainGuard,
}

impl QueryCtx {
    /// Snapshot a user's current select against the given database.
    pub fn for_user(user: &Arc<User>, database: Arc<Database>) -> Self {
        Self {
            user: Some(user.clone()),
            select: user.select(),
            _guard: DrainGuard::new(database.clone()),
            database,
        }
    }

    /// For timer-synthesized queries: no user, select from the timer entry.
    pub fn for_timer(database: Arc<Database>, select: &str) -> Self {
        Self {
            user: None,
            select: select.to_string(),
            _guard: DrainGuard::new(database.clone()),
            database,
        }
    }

    /// Physical key of this query's target entry.
    pub fn dest(&self, key: &str, entry_type: EntryType) -> String {
        crate::keys::encode(key, &self.select, entry_type)
    }

    pub fn send(&self, numeric: Numeric, payload: impl Into<String>) {
        if let Some(user) = &self.user {
            user.send(numeric, payload);
        }
    }
}

/// What a worker sees while running a query: the timer indices, the pause
/// flag, and the outbound queue for partial results.
pub struct RunEnv {
    pub expires: Arc<ExpireIndex>,
    pub futures: Arc<FutureIndex>,
    paused: Arc<AtomicBool>,
    results: flume::Sender<Submitted>,
}

impl RunEnv {
    pub(crate) fn new(
        expires: Arc<ExpireIndex>,
        futures: Arc<FutureIndex>,
        paused: Arc<AtomicBool>,
        results: flume::Sender<Submitted>,
    ) -> Self {
        Self {
            expires,
            futures,
            paused,
            results,
        }
    }

    /// Polled inside every iterator tight loop. False means stop producing:
    /// the user is gone, the flusher is paused, or the database is closing.
    pub fn check_iterator(&self, ctx: &QueryCtx) -> bool {
        if let Some(user) = &ctx.user
            && user.is_quitting()
        {
            return false;
        }
        if self.paused.load(Ordering::SeqCst) {
            return false;
        }
        !ctx.database.is_closing()
    }

    /// Hand a pre-completed partial result to the dispatcher.
    pub fn attach_result(&self, chunk: StreamChunk) {
        let _ = self.results.send(Submitted::new(Box::new(chunk)));
    }
}

/// Offset/limit window for iterators. `limit == -1` is unbounded; the offset
/// only applies to bounded queries, counted across the full match set.
#[derive(Copy, Clone, Debug)]
pub struct Limits {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: -1,
        }
    }
}

/// One hop of a streamed list answer. Partial chunks are attached by the
/// producing worker mid-run; the producing query itself carries the final
/// (non-partial) chunk. `subresult == 1` opens the list, `!partial` closes
/// it, so a cancelled scan leaves the stream without its closing bracket.
pub struct StreamChunk {
    user: Option<Arc<User>>,
    data: ChunkData,
    subresult: u32,
    partial: bool,
    quoted: bool,
}

pub enum ChunkData {
    Items(Vec<String>),
    Pairs(Vec<(String, String)>),
}

impl StreamChunk {
    pub fn flush(&self) {
        let Some(user) = &self.user else {
            return;
        };
        if self.subresult == 1 {
            user.send(Numeric::StartList, "BEGIN");
        }
        match &self.data {
            ChunkData::Items(items) => {
                for item in items {
                    if self.quoted {
                        user.send(Numeric::Item, quote_str(item));
                    } else {
                        user.send(Numeric::Item, item.clone());
                    }
                }
            }
            ChunkData::Pairs(pairs) => {
                for (field, value) in pairs {
                    user.send(Numeric::ItemList, format!("{} {}", field, quote_str(value)));
                }
            }
        }
        if !self.partial {
            user.send(Numeric::EndList, "END");
        }
    }
}

impl Query for StreamChunk {
    fn user(&self) -> Option<&Arc<User>> {
        self.user.as_ref()
    }

    // Chunks are born completed; they only ever flow outbound.
    fn run(&mut self, _env: &RunEnv) -> Result<(), QueryError> {
        Ok(())
    }

    fn process(&self) {
        self.flush();
    }
}

/// Accumulates streamed items under the offset/limit window, attaching a
/// partial chunk every [`ITER_LIMIT`] accepted elements. The buffer being
/// streamed is cleared on each attach; the source collection is untouched.
pub struct Streamer<'a> {
    env: &'a RunEnv,
    user: Option<Arc<User>>,
    quoted: bool,
    limits: Limits,
    total: usize,
    aux: usize,
    tracker: u32,
    buffer: Vec<String>,
}

impl<'a> Streamer<'a> {
    pub fn new(env: &'a RunEnv, ctx: &QueryCtx, limits: Limits, quoted: bool) -> Self {
        Self {
            env,
            user: ctx.user.clone(),
            quoted,
            limits,
            total: 0,
            aux: 0,
            tracker: 0,
            buffer: Vec::new(),
        }
    }

    /// Account one matching element. Returns false once the limit is
    /// reached, signalling the scan loop to stop.
    pub fn push(&mut self, item: String) -> bool {
        if self.limits.limit != -1 {
            if self.total as i64 >= self.limits.offset && (self.aux as i64) < self.limits.limit {
                self.aux += 1;
                self.buffer.push(item);
                self.flush_full();
                if self.aux as i64 == self.limits.limit {
                    self.total += 1;
                    return false;
                }
            }
        } else {
            self.aux += 1;
            self.buffer.push(item);
            self.flush_full();
        }
        self.total += 1;
        true
    }

    fn flush_full(&mut self) {
        if self.buffer.len() < ITER_LIMIT {
            return;
        }
        self.tracker += 1;
        self.env.attach_result(StreamChunk {
            user: self.user.clone(),
            data: ChunkData::Items(std::mem::take(&mut self.buffer)),
            subresult: self.tracker,
            partial: true,
            quoted: self.quoted,
        });
    }

    /// Elements accepted into the window.
    pub fn matched(&self) -> usize {
        self.aux
    }

    /// Elements seen, window or not.
    pub fn scanned(&self) -> usize {
        self.total
    }

    /// The final chunk, carrying whatever remains in the buffer.
    pub fn finish(mut self) -> StreamChunk {
        self.tracker += 1;
        StreamChunk {
            user: self.user,
            data: ChunkData::Items(self.buffer),
            subresult: self.tracker,
            partial: false,
            quoted: self.quoted,
        }
    }
}

/// [`Streamer`], but for (field, value) pair answers.
pub struct PairStreamer<'a> {
    env: &'a RunEnv,
    user: Option<Arc<User>>,
    limits: Limits,
    total: usize,
    aux: usize,
    tracker: u32,
    buffer: Vec<(String, String)>,
}

impl<'a> PairStreamer<'a> {
    pub fn new(env: &'a RunEnv, ctx: &QueryCtx, limits: Limits) -> Self {
        Self {
            env,
            user: ctx.user.clone(),
            limits,
            total: 0,
            aux: 0,
            tracker: 0,
            buffer: Vec::new(),
        }
    }

    pub fn push(&mut self, field: String, value: String) -> bool {
        if self.limits.limit != -1 {
            if self.total as i64 >= self.limits.offset && (self.aux as i64) < self.limits.limit {
                self.aux += 1;
                self.buffer.push((field, value));
                self.flush_full();
                if self.aux as i64 == self.limits.limit {
                    self.total += 1;
                    return false;
                }
            }
        } else {
            self.aux += 1;
            self.buffer.push((field, value));
            self.flush_full();
        }
        self.total += 1;
        true
    }

    fn flush_full(&mut self) {
        if self.buffer.len() < ITER_LIMIT {
            return;
        }
        self.tracker += 1;
        self.env.attach_result(StreamChunk {
            user: self.user.clone(),
            data: ChunkData::Pairs(std::mem::take(&mut self.buffer)),
            subresult: self.tracker,
            partial: true,
            quoted: false,
        });
    }

    pub fn scanned(&self) -> usize {
        self.total
    }

    pub fn finish(mut self) -> StreamChunk {
        self.tracker += 1;
        StreamChunk {
            user: self.user,
            data: ChunkData::Pairs(self.buffer),
            subresult: self.tracker,
            partial: false,
            quoted: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared store access for the query families.
// ---------------------------------------------------------------------------

/// Composite handlers loadable from / storable to one physical row.
pub(crate) trait Composite: Sized {
    const TYPE: EntryType;
    fn decode(bytes: &[u8]) -> Option<Self>;
    fn encode(&self) -> Vec<u8>;
    fn len(&self) -> usize;
}

impl Composite for MapHandler {
    const TYPE: EntryType = EntryType::Map;
    fn decode(bytes: &[u8]) -> Option<Self> {
        MapHandler::from_bytes(bytes)
    }
    fn encode(&self) -> Vec<u8> {
        self.to_bytes()
    }
    fn len(&self) -> usize {
        self.count()
    }
}

impl Composite for MultiMapHandler {
    const TYPE: EntryType = EntryType::MultiMap;
    fn decode(bytes: &[u8]) -> Option<Self> {
        MultiMapHandler::from_bytes(bytes)
    }
    fn encode(&self) -> Vec<u8> {
        self.to_bytes()
    }
    fn len(&self) -> usize {
        self.count()
    }
}

impl Composite for VectorHandler {
    const TYPE: EntryType = EntryType::Vector;
    fn decode(bytes: &[u8]) -> Option<Self> {
        VectorHandler::from_bytes(bytes)
    }
    fn encode(&self) -> Vec<u8> {
        self.to_bytes()
    }
    fn len(&self) -> usize {
        self.count()
    }
}

/// Load a composite row. `Ok(None)` when the row is absent; a blob that does
/// not decode is a malformed entry.
pub(crate) fn load<C: Composite>(ctx: &QueryCtx, key: &str) -> Result<Option<C>, QueryError> {
    let dest = ctx.dest(key, C::TYPE);
    match ctx.database.store().get(&dest) {
        Ok(Some(bytes)) => C::decode(&bytes).map(Some).ok_or(QueryError::InvalidFormat),
        Ok(None) => Ok(None),
        // The original conflates read failure with absence; keep that.
        Err(_) => Ok(None),
    }
}

/// Write a composite row back, collapsing to a delete when it emptied out.
pub(crate) fn save<C: Composite>(ctx: &QueryCtx, key: &str, handler: &C) -> Result<(), QueryError> {
    let dest = ctx.dest(key, C::TYPE);
    if handler.len() == 0 {
        ctx.database
            .store()
            .delete(&dest)
            .map_err(|_| QueryError::UnableWrite)
    } else {
        ctx.database
            .store()
            .put(&dest, &handler.encode())
            .map_err(|_| QueryError::UnableWrite)
    }
}

/// Decode one physical row during a scan and keep it only when it belongs to
/// this query's select, has the wanted type, and its user key matches the
/// glob pattern. Rows that do not follow the key layout are skipped.
pub(crate) fn match_entry(
    ctx: &QueryCtx,
    entry_type: EntryType,
    pattern: &str,
    physical: &[u8],
) -> Option<crate::keys::DecodedKey> {
    let decoded = crate::keys::decode(physical)?;
    if decoded.select != ctx.select || decoded.entry_type != entry_type {
        return None;
    }
    if !beryl_common::glob_match(pattern, &decoded.key) {
        return None;
    }
    Some(decoded)
}

pub(crate) fn plain_get(ctx: &QueryCtx, key: &str) -> Result<Option<String>, QueryError> {
    let dest = ctx.dest(key, EntryType::Key);
    match ctx.database.store().get(&dest) {
        Ok(Some(bytes)) => {
            String::from_utf8(bytes).map(Some).map_err(|_| QueryError::InvalidFormat)
        }
        Ok(None) => Ok(None),
        Err(_) => Ok(None),
    }
}

pub(crate) fn plain_put(ctx: &QueryCtx, key: &str, value: &str) -> Result<(), QueryError> {
    let dest = ctx.dest(key, EntryType::Key);
    ctx.database
        .store()
        .put(&dest, value.as_bytes())
        .map_err(|_| QueryError::UnableWrite)
}

pub(crate) fn plain_delete(ctx: &QueryCtx, key: &str) -> Result<(), QueryError> {
    let dest = ctx.dest(key, EntryType::Key);
    ctx.database
        .store()
        .delete(&dest)
        .map_err(|_| QueryError::UnableWrite)
}
