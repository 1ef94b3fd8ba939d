//! Bucket-indexed priority queue (calendar queue) over timed entries
//!
//! A calendar queue maps each entry to one of `B` cyclic buckets by
//! `⌊time / width⌋ mod B`, like days onto the pages of a desk calendar.
//! While the event stream is dense and near-monotonic — the steady state of
//! a spiking network — the bucket under the cursor holds O(1) entries and
//! the cursor advances with the simulation clock, so both `push` and `pop`
//! are O(1) amortized. Degenerate time distributions fall back to a bounded
//! scan plus an O(k log k) lazy bucket sort.
//!
//! Boundary policy: no epsilon is applied before flooring. An entry whose
//! time lies exactly on a stripe boundary `k·width` belongs to the upper
//! stripe `[k·width, (k+1)·width)`. `push` and `pop` share the same index
//! function, so the policy cannot disagree with itself.
//!
//! Tie-break policy: entries with equal times pop in insertion order.
//! Equal times always map to the same bucket, and the lazy sort is stable.

use std::collections::VecDeque;

use crate::error::{QueueError, Result};
use crate::{DEFAULT_BUCKETS, DEFAULT_BUCKET_WIDTH};

/// Bucket count is doubled and stripe width multiplied by this factor on
/// each resize.
const WIDTH_GROWTH_FACTOR: f64 = 2.0;

/// One bucket of the calendar: entries in insertion order until a pop
/// needs the front, at which point the bucket is stably sorted by time.
#[derive(Debug, Clone)]
struct Bucket<T> {
    entries: VecDeque<Entry<T>>,
    sorted: bool,
}

impl<T> Bucket<T> {
    fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            sorted: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    time: f64,
    value: T,
}

/// A priority queue of timed entries with O(1) amortized insert/extract
/// for dense, near-monotonic time distributions
///
/// Values pop in non-decreasing `time` order; equal times pop in insertion
/// order. Negative times are valid. `top`/`pop` on an empty queue fail with
/// [`QueueError::Empty`].
#[derive(Debug, Clone)]
pub struct CalendarQueue<T> {
    buckets: Vec<Bucket<T>>,
    width: f64,
    len: usize,
    /// Bucket the previous pop extracted from; scans resume here.
    cursor_bucket: usize,
    /// Upper bound of the stripe the cursor currently points into.
    cursor_top: f64,
    /// Time of the most recently popped entry. Every queued entry has a
    /// time >= this, unless a later push re-seats the cursor below it.
    last_time: f64,
}

impl<T> CalendarQueue<T> {
    /// Create a queue with `bucket_count` buckets of stripe `width`
    ///
    /// Both values are tuning knobs, not correctness knobs; any positive
    /// finite pair yields a correct queue.
    pub fn new(bucket_count: usize, width: f64) -> Result<Self> {
        if bucket_count == 0 {
            return Err(QueueError::invalid_parameter(
                "bucket_count",
                bucket_count.to_string(),
                "> 0",
            ));
        }
        if !(width > 0.0 && width.is_finite()) {
            return Err(QueueError::invalid_parameter(
                "width",
                width.to_string(),
                "> 0.0 and finite",
            ));
        }

        let mut buckets = Vec::with_capacity(bucket_count);
        buckets.resize_with(bucket_count, Bucket::new);

        Ok(Self {
            buckets,
            width,
            len: 0,
            cursor_bucket: 0,
            cursor_top: width,
            last_time: f64::NEG_INFINITY,
        })
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Current stripe width
    pub fn bucket_width(&self) -> f64 {
        self.width
    }

    /// Insert `value` keyed by `time`
    ///
    /// Triggers an amortized-O(n) resize when occupancy exceeds twice the
    /// bucket count.
    pub fn push(&mut self, time: f64, value: T) {
        self.insert(Entry { time, value });

        if self.len > 2 * self.buckets.len() {
            self.grow();
        }
    }

    /// Earliest entry as `(time, &value)`, without removing it
    pub fn top(&mut self) -> Result<(f64, &T)> {
        let idx = self.locate_min()?;
        match self.buckets[idx].entries.front() {
            Some(entry) => Ok((entry.time, &entry.value)),
            None => Err(QueueError::invariant("located bucket is empty")),
        }
    }

    /// Remove and return the earliest entry as `(time, value)`
    pub fn pop(&mut self) -> Result<(f64, T)> {
        let idx = self.locate_min()?;
        let entry = match self.buckets[idx].entries.pop_front() {
            Some(entry) => entry,
            None => return Err(QueueError::invariant("located bucket is empty")),
        };
        self.len -= 1;

        self.cursor_bucket = idx;
        self.cursor_top = self.stripe_top(entry.time);
        self.last_time = entry.time;

        Ok((entry.time, entry.value))
    }

    fn bucket_index(&self, time: f64) -> usize {
        let stripe = (time / self.width).floor() as i64;
        stripe.rem_euclid(self.buckets.len() as i64) as usize
    }

    /// Exclusive upper bound of the stripe containing `time`.
    fn stripe_top(&self, time: f64) -> f64 {
        ((time / self.width).floor() + 1.0) * self.width
    }

    fn insert(&mut self, entry: Entry<T>) {
        // An entry earlier than anything popped so far re-seats the cursor,
        // otherwise the scan could walk past it.
        if self.len == 0 || entry.time < self.last_time {
            self.cursor_bucket = self.bucket_index(entry.time);
            self.cursor_top = self.stripe_top(entry.time);
            self.last_time = entry.time;
        }

        let idx = self.bucket_index(entry.time);
        let bucket = &mut self.buckets[idx];
        bucket.sorted = bucket.entries.is_empty();
        bucket.entries.push_back(entry);
        self.len += 1;
    }

    fn sort_bucket(&mut self, idx: usize) {
        let bucket = &mut self.buckets[idx];
        if !bucket.sorted {
            bucket
                .entries
                .make_contiguous()
                .sort_by(|a, b| a.time.total_cmp(&b.time));
            bucket.sorted = true;
        }
    }

    /// Find the bucket holding the earliest entry and leave it sorted.
    ///
    /// Scans forward cyclically from the cursor, accepting a bucket only if
    /// its front entry falls inside the stripe the scan is currently
    /// sweeping (`time < top`). Entries belonging to a later wrap of the
    /// calendar are thereby skipped. If a full cycle accepts nothing (a
    /// sparse distribution whose next entry is more than one calendar span
    /// away), fall back to a direct search over all buckets.
    fn locate_min(&mut self) -> Result<usize> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }

        let bucket_count = self.buckets.len();
        let mut idx = self.cursor_bucket;
        let mut top = self.cursor_top;
        for _ in 0..bucket_count {
            if !self.buckets[idx].entries.is_empty() {
                self.sort_bucket(idx);
                if let Some(front) = self.buckets[idx].entries.front() {
                    if front.time < top {
                        return Ok(idx);
                    }
                }
            }
            idx = (idx + 1) % bucket_count;
            top += self.width;
        }

        self.direct_search()
    }

    /// O(B + k log k) fallback: sort every occupied bucket and take the
    /// globally earliest front, re-seating the cursor there.
    fn direct_search(&mut self) -> Result<usize> {
        for idx in 0..self.buckets.len() {
            self.sort_bucket(idx);
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            if let Some(front) = bucket.entries.front() {
                let better = match best {
                    Some((_, time)) => front.time.total_cmp(&time).is_lt(),
                    None => true,
                };
                if better {
                    best = Some((idx, front.time));
                }
            }
        }

        match best {
            Some((idx, time)) => {
                self.cursor_bucket = idx;
                self.cursor_top = self.stripe_top(time);
                Ok(idx)
            }
            None => Err(QueueError::invariant(
                "non-empty queue scan found no event",
            )),
        }
    }

    /// Double the bucket count, widen the stripes, and redistribute.
    fn grow(&mut self) {
        let new_count = self.buckets.len() * 2;
        let new_width = self.width * WIDTH_GROWTH_FACTOR;
        log::debug!(
            "calendar queue resize: {} buckets x {} -> {} buckets x {} ({} entries)",
            self.buckets.len(),
            self.width,
            new_count,
            new_width,
            self.len
        );

        let old: Vec<Entry<T>> = self
            .buckets
            .iter_mut()
            .flat_map(|bucket| std::mem::take(&mut bucket.entries))
            .collect();

        self.buckets.clear();
        self.buckets.resize_with(new_count, Bucket::new);
        self.width = new_width;
        self.len = 0;
        self.last_time = f64::NEG_INFINITY;

        for entry in old {
            self.insert(entry);
        }
    }
}

impl<T> Default for CalendarQueue<T> {
    fn default() -> Self {
        // The documented defaults always satisfy the constructor.
        match Self::new(DEFAULT_BUCKETS, DEFAULT_BUCKET_WIDTH) {
            Ok(queue) => queue,
            Err(_) => unreachable!("default queue parameters are valid"),
        }
    }
}
