//! Fixed-length position history for visual tails

use glam::DVec2;
use serde::Serialize;

/// Ring buffer of the last `N` positions (no allocation after construction)
#[derive(Debug, Clone, Copy)]
pub struct Trail<const N: usize> {
    points: [DVec2; N],
    /// Index the next push writes to
    head: usize,
    len: usize,
}

impl<const N: usize> Default for Trail<N> {
    fn default() -> Self {
        Self {
            points: [DVec2::ZERO; N],
            head: 0,
            len: 0,
        }
    }
}

impl<const N: usize> Trail<N> {
    pub fn push(&mut self, point: DVec2) {
        if N == 0 {
            return;
        }
        self.points[self.head] = point;
        self.head = (self.head + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Points oldest first
    pub fn iter(&self) -> impl Iterator<Item = DVec2> + '_ {
        let start = (self.head + N - self.len) % N.max(1);
        (0..self.len).map(move |i| self.points[(start + i) % N])
    }

    pub fn newest(&self) -> Option<DVec2> {
        if self.len == 0 {
            None
        } else {
            Some(self.points[(self.head + N - 1) % N])
        }
    }

    /// Copy into a caller-owned buffer (cleared first)
    pub fn copy_into(&self, out: &mut Vec<DVec2>) {
        out.clear();
        out.extend(self.iter());
    }
}

impl<const N: usize> Serialize for Trail<N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|p| [p.x, p.y]))
    }
}
