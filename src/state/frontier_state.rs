//! Working set of a frontier crawl
//!
//! The frontier is an arena keyed by content id: a grow-only visited set, a
//! FIFO queue of candidates and a mirror set of the ids currently queued.

use std::collections::{HashSet, VecDeque};

/// A locator waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCandidate {
    pub id: String,
    pub locator: String,
}

impl QueuedCandidate {
    pub fn new(id: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
        }
    }
}

/// Visited set plus breadth-first queue
///
/// Invariant: an id is never both visited and queued. Once an id is marked
/// visited it can never be queued again.
#[derive(Debug, Default)]
pub struct FrontierState {
    visited: HashSet<String>,
    queue: VecDeque<QueuedCandidate>,
    queued: HashSet<String>,
}

impl FrontierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate to the back of the queue
    ///
    /// Returns false, leaving the state untouched, if the id was already
    /// visited or is already queued.
    pub fn enqueue(&mut self, candidate: QueuedCandidate) -> bool {
        if self.visited.contains(&candidate.id) || self.queued.contains(&candidate.id) {
            return false;
        }
        self.queued.insert(candidate.id.clone());
        self.queue.push_back(candidate);
        true
    }

    /// Pops the oldest queued candidate that has not been visited
    pub fn pop_unvisited(&mut self) -> Option<QueuedCandidate> {
        while let Some(candidate) = self.queue.pop_front() {
            self.queued.remove(&candidate.id);
            if !self.visited.contains(&candidate.id) {
                return Some(candidate);
            }
        }
        None
    }

    /// Marks an id as visited, removing it from the queue if present
    ///
    /// Returns true if the id was not visited before.
    pub fn mark_visited(&mut self, id: &str) -> bool {
        if self.queued.remove(id) {
            self.queue.retain(|candidate| candidate.id != id);
        }
        self.visited.insert(id.to_string())
    }

    /// Drops candidates from the back until at most `max_len` remain
    ///
    /// Returns how many candidates were dropped.
    pub fn truncate(&mut self, max_len: usize) -> usize {
        if self.queue.len() <= max_len {
            return 0;
        }
        let dropped: Vec<QueuedCandidate> = self.queue.drain(max_len..).collect();
        for candidate in &dropped {
            self.queued.remove(&candidate.id);
        }
        dropped.len()
    }

    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    pub fn is_queued(&self, id: &str) -> bool {
        self.queued.contains(id)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Ids currently queued, front first
    pub fn queued_ids(&self) -> Vec<&str> {
        self.queue.iter().map(|c| c.id.as_str()).collect()
    }
}
