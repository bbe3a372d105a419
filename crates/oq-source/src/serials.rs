//! Deterministic dense rupture-serial allocation: every source is assigned
//! a contiguous range of serial numbers sized to its rupture count, in
//! source order, exactly as `SourceManager.__init__` pre-allocates
//! `numpy.arange(n, dtype=uint32)` and slices it per source. Splitting a
//! source into children later reslices the same range rather than
//! reassigning new numbers, so serials stay stable regardless of how a
//! source is chunked for parallel execution.

use std::collections::HashMap;
use std::ops::Range;

/// Assigns `[start, start + num_ruptures)` to each source in order,
/// starting from `start`. Returns source id -> serial range.
pub fn assign_serials<'a, I>(sources: I, start: u32) -> HashMap<String, Range<u32>>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let mut out = HashMap::new();
    let mut next = start;
    for (id, num_ruptures) in sources {
        let range = next..(next + num_ruptures);
        out.insert(id.to_string(), range.clone());
        next = range.end;
    }
    out
}

/// Slices a parent source's serial range for one of its split children,
/// given the child's offset and rupture count within the parent.
pub fn child_range(parent_range: &Range<u32>, offset: u32, count: u32) -> Range<u32> {
    let start = parent_range.start + offset;
    let end = (start + count).min(parent_range.end);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_contiguous_non_overlapping_ranges() {
        let sources = vec![("s1", 5u32), ("s2", 3u32), ("s3", 2u32)];
        let ranges = assign_serials(sources, 0);
        assert_eq!(ranges["s1"], 0..5);
        assert_eq!(ranges["s2"], 5..8);
        assert_eq!(ranges["s3"], 8..10);
    }

    #[test]
    fn starts_from_a_nonzero_offset() {
        let sources = vec![("s1", 4u32)];
        let ranges = assign_serials(sources, 100);
        assert_eq!(ranges["s1"], 100..104);
    }

    #[test]
    fn child_range_stays_within_parent() {
        let parent = 10..20;
        let child = child_range(&parent, 3, 4);
        assert_eq!(child, 13..17);
    }

    #[test]
    fn child_range_is_clamped_to_parent_end() {
        let parent = 10..15;
        let child = child_range(&parent, 3, 10);
        assert_eq!(child, 13..15);
    }
}
