//! Set representations for 1-based purpose, feature and vendor ids.
//!
//! The wire format stores the same logical data either as a fixed-width
//! bitfield or as a list of id ranges. Both are kept behind the uniform
//! membership/iteration interface of [`IdSet`] so that consumers never depend
//! on which encoding a given string happened to use. Equality is
//! set-semantic: a bitfield and a range list holding the same members
//! compare equal.

use std::ops::RangeInclusive;

/// A fixed-width bit-vector holding ids `1..=width`.
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    width: u16,
    words: Vec<u64>,
}

impl BitSet {
    pub fn with_width(width: u16) -> Self {
        Self {
            width,
            words: vec![0; (width as usize).div_ceil(64)],
        }
    }

    /// The number of bit positions, i.e. the largest representable id.
    pub fn width(&self) -> u16 {
        self.width
    }

    pub(crate) fn insert(&mut self, id: u16) {
        debug_assert!(id >= 1 && id <= self.width);
        let i = usize::from(id - 1);
        self.words[i / 64] |= 1 << (i % 64);
    }

    pub fn contains(&self, id: u16) -> bool {
        if id == 0 || id > self.width {
            return false;
        }
        let i = usize::from(id - 1);
        self.words[i / 64] >> (i % 64) & 1 == 1
    }

    /// Iterates over the contained ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (1..=self.width).filter(|&id| self.contains(id))
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for BitSet {}

impl FromIterator<u16> for BitSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let ids: Vec<u16> = iter.into_iter().collect();
        let width = ids.iter().copied().max().unwrap_or(0);
        let mut set = BitSet::with_width(width);
        for id in ids {
            if id > 0 {
                set.insert(id);
            }
        }
        set
    }
}

impl<const N: usize> From<[u16; N]> for BitSet {
    fn from(ids: [u16; N]) -> Self {
        ids.into_iter().collect()
    }
}

/// A set of 1-based ids, stored the way the wire encoded it.
#[derive(Clone, Debug)]
pub enum IdSet {
    BitField(BitSet),
    /// Sorted, disjoint, inclusive intervals.
    Ranges(Vec<RangeInclusive<u16>>),
}

impl IdSet {
    /// Builds the range variant from raw `(start, end)` entries, normalizing
    /// them into sorted intervals with overlapping and adjacent entries
    /// merged. Entries must already be validated (`start >= 1`,
    /// `start <= end`).
    pub(crate) fn from_ranges(entries: impl IntoIterator<Item = (u16, u16)>) -> Self {
        let mut entries: Vec<(u16, u16)> = entries.into_iter().collect();
        entries.sort_unstable();

        let mut merged: Vec<RangeInclusive<u16>> = Vec::new();
        for (start, end) in entries {
            match merged.last_mut() {
                Some(last) if u32::from(start) <= u32::from(*last.end()) + 1 => {
                    if end > *last.end() {
                        *last = *last.start()..=end;
                    }
                }
                _ => merged.push(start..=end),
            }
        }

        IdSet::Ranges(merged)
    }

    pub fn contains(&self, id: u16) -> bool {
        match self {
            IdSet::BitField(b) => b.contains(id),
            IdSet::Ranges(ranges) => ranges.iter().any(|r| r.contains(&id)),
        }
    }

    /// Iterates over the contained ids in ascending order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u16> + '_> {
        match self {
            IdSet::BitField(b) => Box::new(b.iter()),
            IdSet::Ranges(ranges) => Box::new(ranges.iter().flat_map(|r| r.clone())),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IdSet::BitField(b) => b.len(),
            IdSet::Ranges(ranges) => ranges
                .iter()
                .map(|r| usize::from(*r.end()) - usize::from(*r.start()) + 1)
                .sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdSet {
    fn default() -> Self {
        IdSet::BitField(BitSet::default())
    }
}

impl PartialEq for IdSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for IdSet {}

impl FromIterator<u16> for IdSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        IdSet::BitField(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[u16; N]> for IdSet {
    fn from(ids: [u16; N]) -> Self {
        ids.into_iter().collect()
    }
}
