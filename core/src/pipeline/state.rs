//! Synchronous admission bookkeeping behind [`super::LoadQueue`].
//!
//! Keys are either in flight (their loader is running), pending (waiting for capacity), or
//! unknown. Every known key owns one list of waiters in `waiters`; the pending FIFO holds each
//! waiting key exactly once, in order of its first request.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// How a request was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Capacity was free; the caller must start the load now.
    Admitted,
    /// Capacity was exhausted; the key joined the pending FIFO.
    Queued,
    /// The key was already in flight or pending; the request shares that load.
    Coalesced,
}

/// Keys whose loads finished, and keys the caller must start next.
#[derive(Debug)]
pub struct Completion<K, W> {
    pub waiters: Vec<W>,
    pub admitted: Vec<K>,
}

#[derive(Debug)]
pub struct AdmissionState<K, W> {
    capacity: usize,
    in_flight: HashSet<K>,
    pending: VecDeque<K>,
    waiters: HashMap<K, Vec<W>>,
    peak_in_flight: usize,
}

impl<K, W> AdmissionState<K, W> {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }
}

impl<K, W> AdmissionState<K, W>
where
    K: Clone + Eq + Hash,
{
    /// `capacity` must be non-zero; the async wrapper validates it.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_flight: HashSet::new(),
            pending: VecDeque::new(),
            waiters: HashMap::new(),
            peak_in_flight: 0,
        }
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains(key)
    }

    /// Register interest in `key`.
    pub fn request(&mut self, key: K, waiter: W) -> Admission {
        if let Some(waiters) = self.waiters.get_mut(&key) {
            waiters.push(waiter);
            return Admission::Coalesced;
        }

        self.waiters.insert(key.clone(), vec![waiter]);
        if self.in_flight.len() < self.capacity {
            self.mark_in_flight(key);
            Admission::Admitted
        } else {
            self.pending.push_back(key);
            Admission::Queued
        }
    }

    /// Settle the load for `key`: release its slot, hand back its waiters, and admit pending
    /// keys in arrival order until capacity is used up again.
    ///
    /// Completing a key that is not in flight releases nothing and admits nothing.
    pub fn complete(&mut self, key: &K) -> Completion<K, W> {
        if !self.in_flight.remove(key) {
            return Completion { waiters: Vec::new(), admitted: Vec::new() };
        }
        let waiters = self.waiters.remove(key).unwrap_or_default();

        let mut admitted = Vec::new();
        while self.in_flight.len() < self.capacity {
            let Some(next) = self.pending.pop_front() else { break };
            self.mark_in_flight(next.clone());
            admitted.push(next);
        }

        Completion { waiters, admitted }
    }

    fn mark_in_flight(&mut self, key: K) {
        self.in_flight.insert(key);
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
    }
}
