//! UID sets.

use super::Uid;

/// A set of UIDs in IMAP `sequence-set` syntax, e.g. `1,4:7,9`.
///
/// Ranges keep the order they were written in, which COPYUID relies on to
/// pair source and destination UIDs. `*` is not supported; every bound is a
/// concrete UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidSet {
    ranges: Vec<(Uid, Uid)>,
}

impl UidSet {
    /// A set holding one UID.
    #[must_use]
    pub fn single(uid: Uid) -> Self {
        Self {
            ranges: vec![(uid, uid)],
        }
    }

    /// Builds a set from UIDs, folding consecutive runs into ranges.
    ///
    /// Returns `None` for an empty input.
    #[must_use]
    pub fn from_uids(uids: &[Uid]) -> Option<Self> {
        let (first, rest) = uids.split_first()?;
        let mut ranges = vec![(*first, *first)];
        for &uid in rest {
            if let Some(last) = ranges.last_mut()
                && last.1.get().checked_add(1) == Some(uid.get())
            {
                last.1 = uid;
                continue;
            }
            ranges.push((uid, uid));
        }
        Some(Self { ranges })
    }

    /// Parses `sequence-set` syntax without `*`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut ranges = Vec::new();
        for part in s.split(',') {
            let (start, end) = match part.split_once(':') {
                Some((a, b)) => (a, b),
                None => (part, part),
            };
            let start = Uid::new(start.trim().parse().ok()?)?;
            let end = Uid::new(end.trim().parse().ok()?)?;
            ranges.push((start, end));
        }
        if ranges.is_empty() {
            None
        } else {
            Some(Self { ranges })
        }
    }

    /// Iterates over every UID in the set, in written order.
    ///
    /// A range written high-to-low (`5:3`) is walked in ascending order, as
    /// RFC 9051 treats both spellings as the same set.
    pub fn iter(&self) -> impl Iterator<Item = Uid> + '_ {
        self.ranges.iter().flat_map(|&(a, b)| {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            (lo.get()..=hi.get()).filter_map(Uid::new)
        })
    }

    /// Returns the number of UIDs in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .map(|&(a, b)| a.get().abs_diff(b.get()) as usize + 1)
            .sum()
    }

    /// Always false; a set holds at least one UID.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (start, end)) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}:{end}")?;
            }
        }
        Ok(())
    }
}
