//! Bounded fingertip trails.
//!
//! One ring buffer per `(handedness, finger)`, like the ribbon buffers of
//! the visualizer: the newest sample goes on the back, the oldest falls off
//! the front once the buffer is full.

use std::collections::VecDeque;

use crate::landmarks::Handedness;
use crate::state::{Finger, HandState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailSample {
    pub x:    f32,
    pub y:    f32,
    pub t_ms: f64,
}

#[derive(Clone, Debug)]
pub struct FingerTrail {
    samples:  VecDeque<TrailSample>,
    capacity: usize,
}

impl FingerTrail {
    pub fn new(capacity: usize) -> Self {
        FingerTrail {
            samples:  VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, sample: TrailSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Shrink or grow the cap; excess oldest samples are dropped.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) { self.samples.clear(); }

    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrailSample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&TrailSample> { self.samples.back() }
}

/// All ten trails plus the no-hands timeout.
#[derive(Clone, Debug)]
pub struct TrailStore {
    trails:       [[FingerTrail; 5]; 2],
    timeout_ms:   f64,
    last_seen_ms: Option<f64>,
}

impl TrailStore {
    pub fn new(capacity: usize, timeout_ms: f64) -> Self {
        let row = || std::array::from_fn(|_| FingerTrail::new(capacity));
        TrailStore {
            trails:       [row(), row()],
            timeout_ms,
            last_seen_ms: None,
        }
    }

    /// Append the current fingertips, or apply the fade-out policy when no
    /// hand is visible. Returns `true` when this call cleared the trails.
    pub fn update(&mut self, hands: &[&HandState], now_ms: f64) -> bool {
        if hands.is_empty() {
            let expired = self.last_seen_ms
                .map(|seen| now_ms - seen > self.timeout_ms)
                .unwrap_or(false);
            if expired {
                self.clear();
                self.last_seen_ms = None;
                log::debug!("no hands for {:.0} ms, trails cleared", self.timeout_ms);
                return true;
            }
            return false;
        }

        self.last_seen_ms = Some(now_ms);
        for hand in hands {
            for tip in &hand.fingertips {
                self.trails[hand.handedness.slot()][tip.finger.index()].push(TrailSample {
                    x:    tip.position.x,
                    y:    tip.position.y,
                    t_ms: now_ms,
                });
            }
        }
        false
    }

    pub fn get(&self, handedness: Handedness, finger: Finger) -> &FingerTrail {
        &self.trails[handedness.slot()][finger.index()]
    }

    /// Every trail with its identity, left hand first.
    pub fn iter(&self) -> impl Iterator<Item = (Handedness, Finger, &FingerTrail)> {
        [Handedness::Left, Handedness::Right].into_iter().flat_map(move |h| {
            Finger::ALL.into_iter().map(move |f| (h, f, self.get(h, f)))
        })
    }

    pub fn clear(&mut self) {
        self.trails.iter_mut().flatten().for_each(FingerTrail::clear);
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.trails.iter_mut().flatten().for_each(|t| t.set_capacity(capacity));
    }

    pub fn set_timeout(&mut self, timeout_ms: f64) { self.timeout_ms = timeout_ms; }

    pub fn is_empty(&self) -> bool {
        self.trails.iter().flatten().all(FingerTrail::is_empty)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Handedness;
    use crate::pose::PoseKind;
    use crate::synth::SyntheticHand;
    use proptest::prelude::*;

    fn sample(t: f64) -> TrailSample { TrailSample { x: t as f32, y: 0.0, t_ms: t } }

    #[test]
    fn fifo_eviction() {
        let mut t = FingerTrail::new(3);
        for i in 0..5 { t.push(sample(i as f64)); }
        let ts: Vec<f64> = t.iter().map(|s| s.t_ms).collect();
        assert_eq!(ts, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn shrink_drops_oldest() {
        let mut t = FingerTrail::new(5);
        for i in 0..5 { t.push(sample(i as f64)); }
        t.set_capacity(2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.iter().next().unwrap().t_ms, 3.0);
    }

    #[test]
    fn stale_trails_survive_until_timeout() {
        let hand = HandState::from_frame(
            &SyntheticHand::new(Handedness::Right, PoseKind::Five).frame(), 640.0, 480.0, true,
        );
        let mut store = TrailStore::new(8, 500.0);
        store.update(&[&hand], 0.0);
        assert!(!store.update(&[], 400.0));
        assert_eq!(store.get(Handedness::Right, Finger::Index).len(), 1);
        assert!(store.update(&[], 600.0));
        assert!(store.is_empty());
    }

    #[test]
    fn iter_visits_all_ten() {
        let store = TrailStore::new(4, 100.0);
        assert_eq!(store.iter().count(), 10);
    }

    proptest! {
        #[test]
        fn trail_never_exceeds_capacity(cap in 1usize..32, pushes in 0usize..200) {
            let mut t = FingerTrail::new(cap);
            for i in 0..pushes {
                t.push(sample(i as f64));
                prop_assert!(t.len() <= cap);
            }
            if pushes > 0 {
                prop_assert_eq!(t.latest().unwrap().t_ms, (pushes - 1) as f64);
                let oldest = pushes.saturating_sub(cap) as f64;
                prop_assert_eq!(t.iter().next().unwrap().t_ms, oldest);
            }
        }
    }
}
