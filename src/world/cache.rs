//! Bounded chunk store
//!
//! The cache is the only owner of generated chunks. Every slot is either
//! `Pending` (a generation task is queued or running) or `Ready`. Handing out
//! generation work happens here, which is what keeps at most one task in
//! flight per coordinate.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::chunk::{Chunk, ChunkCoord, ChunkView};
use crate::error::GenerationError;
use crate::world::loader::{GenerationQueue, GenerationTask};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RequestOutcome {
    AlreadyResident,
    AlreadyPending,
    Started,
}

enum SlotState {
    Pending {
        /// Set when the slot was evicted while its task was still running.
        evict_on_arrival: bool,
    },
    Ready {
        chunk: Chunk,
        generated_tick: u64,
    },
}

struct CacheEntry {
    state: SlotState,
    last_accessed: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub ready: usize,
    pub pending: usize,
    pub requested: u64,
    pub completed: u64,
    pub evicted: u64,
    pub failed: u64,
    /// Chunks dropped on arrival because they were evicted while pending.
    pub discarded: u64,
}

pub struct ChunkCache<Q> {
    entries: FxHashMap<ChunkCoord, CacheEntry>,
    recent_failures: FxHashMap<ChunkCoord, u64>,
    queue: Q,
    max_resident: usize,
    clock: u64,
    focus: ChunkCoord,
    stats: CacheStats,
}

impl<Q: GenerationQueue> ChunkCache<Q> {
    pub fn new(queue: Q, max_resident: u32) -> Self {
        ChunkCache {
            entries: FxHashMap::default(),
            recent_failures: FxHashMap::default(),
            queue,
            max_resident: max_resident as usize,
            clock: 0,
            focus: ChunkCoord::default(),
            stats: CacheStats::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Clock and focus
    // -----------------------------------------------------------------------

    /// Tick stamped onto accesses and insertions from now on.
    pub fn set_clock(&mut self, tick: u64) {
        self.clock = tick;
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Observer chunk used for task priorities and LRU tie-breaks.
    pub fn set_focus(&mut self, focus: ChunkCoord) {
        self.focus = focus;
    }

    pub fn focus(&self) -> ChunkCoord {
        self.focus
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Read-only view of a `Ready` chunk. Never starts generation.
    pub fn get(&self, coord: ChunkCoord) -> Option<ChunkView<'_>> {
        match self.entries.get(&coord) {
            Some(CacheEntry {
                state:
                    SlotState::Ready {
                        chunk,
                        generated_tick,
                    },
                ..
            }) => Some(ChunkView::new(chunk, *generated_tick)),
            _ => None,
        }
    }

    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        matches!(
            self.entries.get(&coord),
            Some(CacheEntry {
                state: SlotState::Pending { .. },
                ..
            })
        )
    }

    pub fn last_accessed(&self, coord: ChunkCoord) -> Option<u64> {
        self.entries.get(&coord).map(|e| e.last_accessed)
    }

    pub fn ready_count(&self) -> usize {
        self.stats.ready
    }

    pub fn pending_count(&self) -> usize {
        self.stats.pending
    }

    pub fn max_resident(&self) -> usize {
        self.max_resident
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        self.entries
            .iter()
            .filter(|(_, e)| matches!(e.state, SlotState::Ready { .. }))
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Every tracked slot, pending or ready, farther than `radius` from `center`.
    pub fn coords_beyond(&self, center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
        self.entries
            .keys()
            .filter(|coord| coord.chebyshev(center) > radius)
            .copied()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Demand
    // -----------------------------------------------------------------------

    /// Ask for `coord` to become resident.
    ///
    /// Starts at most one generation task per coordinate; repeated calls while
    /// the task is outstanding return [`RequestOutcome::AlreadyPending`].
    pub fn request(&mut self, coord: ChunkCoord) -> RequestOutcome {
        if let Some(entry) = self.entries.get_mut(&coord) {
            return match &mut entry.state {
                SlotState::Ready { .. } => RequestOutcome::AlreadyResident,
                SlotState::Pending { evict_on_arrival } => {
                    // Wanted again before it arrived.
                    *evict_on_arrival = false;
                    RequestOutcome::AlreadyPending
                }
            };
        }

        self.entries.insert(
            coord,
            CacheEntry {
                state: SlotState::Pending {
                    evict_on_arrival: false,
                },
                last_accessed: self.clock,
            },
        );
        self.recent_failures.remove(&coord);
        self.stats.pending += 1;
        self.stats.requested += 1;

        self.queue.submit(GenerationTask {
            coord,
            priority: coord.chebyshev(self.focus),
        });
        RequestOutcome::Started
    }

    /// Refresh the last-accessed tick of a tracked slot.
    pub fn touch(&mut self, coord: ChunkCoord) -> bool {
        match self.entries.get_mut(&coord) {
            Some(entry) => {
                entry.last_accessed = self.clock;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Ingestion (main thread only, once per tick)
    // -----------------------------------------------------------------------

    /// Store a finished chunk and enforce the residency bound.
    pub fn complete(&mut self, coord: ChunkCoord, chunk: Chunk) {
        if chunk.coord() != coord {
            tracing::warn!(
                "Completion for {} carried chunk {}, dropping it",
                coord,
                chunk.coord()
            );
            return;
        }

        let Some(entry) = self.entries.get_mut(&coord) else {
            tracing::warn!("Completion for chunk {} that was never requested", coord);
            return;
        };

        match entry.state {
            SlotState::Ready { .. } => {
                tracing::warn!("Duplicate completion for resident chunk {}", coord);
                return;
            }
            SlotState::Pending {
                evict_on_arrival: true,
            } => {
                self.entries.remove(&coord);
                self.stats.pending -= 1;
                self.stats.discarded += 1;
                tracing::trace!("Chunk {} arrived after eviction, discarded", coord);
                return;
            }
            SlotState::Pending {
                evict_on_arrival: false,
            } => {
                entry.state = SlotState::Ready {
                    chunk,
                    generated_tick: self.clock,
                };
                entry.last_accessed = self.clock;
            }
        }

        self.stats.pending -= 1;
        self.stats.ready += 1;
        self.stats.completed += 1;

        while self.stats.ready > self.max_resident {
            if self.evict_lru().is_none() {
                break;
            }
        }
    }

    /// Return a failed slot to absent so a later request can retry it.
    pub fn fail(&mut self, error: &GenerationError) {
        let coord = error.coord();
        if !self.is_pending(coord) {
            tracing::warn!("Failure reported for chunk {} that is not pending", coord);
            return;
        }

        self.entries.remove(&coord);
        self.recent_failures.insert(coord, self.clock);
        self.stats.pending -= 1;
        self.stats.failed += 1;
        tracing::error!("Chunk generation failed: {}", error);
    }

    /// Whether `coord` failed within the last `cooldown` ticks.
    pub fn failed_recently(&self, coord: ChunkCoord, cooldown: u64) -> bool {
        self.recent_failures
            .get(&coord)
            .is_some_and(|&at| self.clock.saturating_sub(at) < cooldown)
    }

    pub fn prune_failures(&mut self, cooldown: u64) {
        let clock = self.clock;
        self.recent_failures
            .retain(|_, at| clock.saturating_sub(*at) < cooldown);
    }

    // -----------------------------------------------------------------------
    // Eviction
    // -----------------------------------------------------------------------

    /// Drop a `Ready` chunk. A pending slot is not cancelled; its chunk is
    /// discarded as soon as it arrives. Returns whether a chunk was removed.
    pub fn evict(&mut self, coord: ChunkCoord) -> bool {
        let Some(entry) = self.entries.get_mut(&coord) else {
            return false;
        };

        match &mut entry.state {
            SlotState::Pending { evict_on_arrival } => {
                *evict_on_arrival = true;
                false
            }
            SlotState::Ready { .. } => {
                self.entries.remove(&coord);
                self.stats.ready -= 1;
                self.stats.evicted += 1;
                tracing::trace!("Evicted chunk {}", coord);
                true
            }
        }
    }

    /// Evict the least recently used `Ready` chunk.
    ///
    /// Ties on the access tick go to the chunk farthest from the focus
    /// (Chebyshev, then Manhattan), then to the lowest `(cy, cx)`.
    pub fn evict_lru(&mut self) -> Option<ChunkCoord> {
        let focus = self.focus;
        let victim = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e.state, SlotState::Ready { .. }))
            .min_by_key(|(coord, e)| {
                (
                    e.last_accessed,
                    Reverse(coord.chebyshev(focus)),
                    Reverse(coord.manhattan(focus)),
                    coord.cy,
                    coord.cx,
                )
            })
            .map(|(coord, _)| *coord)?;

        self.evict(victim);
        Some(victim)
    }
}
