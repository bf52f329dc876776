//! Ordered track list.
//!
//! An array-backed deque so the playback loop gets O(1) peek and in-place
//! head replacement (needed to install a pre-activated track without
//! disturbing queue order). Mutations are serialized by the owning
//! session's lock; the list itself is not synchronized.

use std::collections::VecDeque;

use rand::seq::SliceRandom;

use crate::track::Track;

/// FIFO of queued/active tracks with peek, shuffle, and head replacement.
#[derive(Default)]
pub struct TrackList {
    items: VecDeque<Track>,
}

impl TrackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track at the tail.
    pub fn push_back(&mut self, track: Track) {
        self.items.push_back(track);
    }

    /// Remove and return the head.
    pub fn pop_front(&mut self) -> Option<Track> {
        self.items.pop_front()
    }

    /// Head without removal.
    pub fn peek_head(&self) -> Option<&Track> {
        self.items.front()
    }

    /// Swap the head for another track, returning the previous head.
    ///
    /// Returns `None` (dropping the replacement) when the list is empty;
    /// callers check the head under the same lock before replacing.
    pub fn replace_head(&mut self, track: Track) -> Option<Track> {
        let head = self.items.front_mut()?;
        Some(std::mem::replace(head, track))
    }

    /// Randomize the order in place.
    ///
    /// The currently playing track is unaffected; it was removed from the
    /// list when selected.
    pub fn shuffle(&mut self) {
        self.items.make_contiguous().shuffle(&mut rand::rng());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.items.iter()
    }
}
