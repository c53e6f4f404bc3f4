use crate::algebra::BooleanAlgebra;
use crate::Symbol;
use serde::{Deserialize, Serialize};
use std::cmp::{max, min};
use std::fmt;
use std::marker::PhantomData;

pub trait IntervalDomain: Symbol + Ord {
    fn min_elem() -> Self;
    fn max_elem() -> Self;
    fn next_up(self) -> Option<Self>;
    fn next_down(self) -> Option<Self>;
}

impl IntervalDomain for char {
    fn min_elem() -> Self {
        '\u{0}'
    }
    fn max_elem() -> Self {
        '\u{10FFFF}'
    }
    fn next_up(self) -> Option<Self> {
        // the scalar value domain has a hole at the surrogate block
        if self == '\u{10FFFF}' {
            return None;
        }
        if self == '\u{D7FF}' {
            return Some('\u{E000}');
        }
        return std::char::from_u32(self as u32 + 1);
    }
    fn next_down(self) -> Option<Self> {
        if self == '\u{0}' {
            return None;
        }
        if self == '\u{E000}' {
            return Some('\u{D7FF}');
        }
        return std::char::from_u32(self as u32 - 1);
    }
}

macro_rules! int_interval_domain {
    ( $( $t:ty ),* ) => {
        $(
            impl IntervalDomain for $t {
                fn min_elem() -> Self {
                    <$t as num::Bounded>::min_value()
                }
                fn max_elem() -> Self {
                    <$t as num::Bounded>::max_value()
                }
                fn next_up(self) -> Option<Self> {
                    num::CheckedAdd::checked_add(&self, &<$t as num::One>::one())
                }
                fn next_down(self) -> Option<Self> {
                    num::CheckedSub::checked_sub(&self, &<$t as num::One>::one())
                }
            }
        )*
    };
}
int_interval_domain!(u8, u32, u64, i32, i64);

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(bound = "T: IntervalDomain")]
pub struct IntervalPred<T: IntervalDomain> {
    ranges: Vec<(T, T)>,
}

impl<T: IntervalDomain> IntervalPred<T> {
    // normalizes: drops empty ranges, sorts, merges overlapping and adjacent ones
    pub fn new(ranges: Vec<(T, T)>) -> Self {
        let mut ranges: Vec<(T, T)> = ranges.into_iter().filter(|(lo, hi)| lo <= hi).collect();
        ranges.sort();
        let mut merged: Vec<(T, T)> = Vec::new();
        for (lo, hi) in ranges {
            if let Some(last) = merged.last_mut() {
                let touches = match last.1.next_up() {
                    None => true,
                    Some(nxt) => lo <= nxt,
                };
                if touches {
                    if hi > last.1 {
                        last.1 = hi;
                    }
                    continue;
                }
            }
            merged.push((lo, hi));
        }
        return IntervalPred { ranges: merged };
    }
    pub fn none() -> Self {
        IntervalPred { ranges: vec![] }
    }
    pub fn full() -> Self {
        IntervalPred {
            ranges: vec![(T::min_elem(), T::max_elem())],
        }
    }
    pub fn singleton(s: T) -> Self {
        IntervalPred { ranges: vec![(s, s)] }
    }
    pub fn range(lo: T, hi: T) -> Self {
        Self::new(vec![(lo, hi)])
    }
    pub fn is_empty(&self) -> bool {
        return self.ranges.is_empty();
    }
    pub fn ranges(&self) -> &Vec<(T, T)> {
        return &self.ranges;
    }
    fn intersect(&self, other: &Self) -> Self {
        let a = &self.ranges;
        let b = &other.ranges;
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let lo = max(a[i].0, b[j].0);
            let hi = min(a[i].1, b[j].1);
            if lo <= hi {
                out.push((lo, hi));
            }
            if a[i].1 < b[j].1 {
                i += 1;
            } else {
                j += 1;
            }
        }
        return IntervalPred { ranges: out };
    }
    fn complement(&self) -> Self {
        let mut out = Vec::new();
        let mut cur = Some(T::min_elem());
        for (lo, hi) in &self.ranges {
            if let Some(c) = cur {
                if c < *lo {
                    if let Some(before) = lo.next_down() {
                        out.push((c, before));
                    }
                }
            }
            cur = hi.next_up();
            if cur.is_none() {
                break;
            }
        }
        if let Some(c) = cur {
            out.push((c, T::max_elem()));
        }
        return IntervalPred { ranges: out };
    }
}

impl<T: IntervalDomain> fmt::Display for IntervalPred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return write!(f, "∅");
        }
        for (lo, hi) in &self.ranges {
            if lo == hi {
                write!(f, "[{:?}]", lo)?;
            } else {
                write!(f, "[{:?}-{:?}]", lo, hi)?;
            }
        }
        return Ok(());
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntervalAlgebra<T: IntervalDomain> {
    _domain: PhantomData<T>,
}

impl<T: IntervalDomain> IntervalAlgebra<T> {
    pub fn new() -> Self {
        IntervalAlgebra { _domain: PhantomData }
    }
}

impl<T: IntervalDomain> BooleanAlgebra for IntervalAlgebra<T> {
    type Predicate = IntervalPred<T>;
    type Sym = T;
    fn mk_true(&self) -> Self::Predicate {
        IntervalPred::full()
    }
    fn mk_and(&self, p: &Self::Predicate, q: &Self::Predicate) -> Self::Predicate {
        p.intersect(q)
    }
    fn mk_or(&self, p: &Self::Predicate, q: &Self::Predicate) -> Self::Predicate {
        let mut ranges = p.ranges.clone();
        ranges.extend(q.ranges.iter().cloned());
        IntervalPred::new(ranges)
    }
    fn mk_not(&self, p: &Self::Predicate) -> Self::Predicate {
        p.complement()
    }
    fn is_satisfiable(&self, p: &Self::Predicate) -> bool {
        return !p.is_empty();
    }
    fn are_equivalent(&self, p: &Self::Predicate, q: &Self::Predicate) -> bool {
        // normalized form is canonical
        return p == q;
    }
    fn has_model(&self, p: &Self::Predicate, s: &Self::Sym) -> bool {
        return p.ranges.iter().any(|(lo, hi)| lo <= s && s <= hi);
    }
    fn generate_witness(&self, p: &Self::Predicate) -> Option<Self::Sym> {
        return p.ranges.first().map(|(lo, _)| *lo);
    }
}

#[macro_export]
macro_rules! make_pred {
    ( $( $lo:expr , $hi:expr );* ) => {
        $crate::interval_algebra::IntervalPred::new(vec![ $( ($lo, $hi) ),* ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sorts_and_merges() {
        let p = IntervalPred::new(vec![('c', 'd'), ('a', 'b')]);
        assert_eq!(p, IntervalPred::range('a', 'd'));
        let q = IntervalPred::new(vec![('a', 'f'), ('c', 'z')]);
        assert_eq!(q, IntervalPred::range('a', 'z'));
        let r = IntervalPred::new(vec![('b', 'a')]);
        assert!(r.is_empty());
    }
    #[test]
    fn intersection() {
        let ba = IntervalAlgebra::<char>::new();
        let p = make_pred!['a', 'f'; 'k', 'p'];
        let q = IntervalPred::range('d', 'm');
        assert_eq!(ba.mk_and(&p, &q), make_pred!['d', 'f'; 'k', 'm']);
        let disjoint = ba.mk_and(&IntervalPred::range('a', 'c'), &IntervalPred::range('x', 'z'));
        assert!(!ba.is_satisfiable(&disjoint));
    }
    #[test]
    fn complement_roundtrip() {
        let ba = IntervalAlgebra::<char>::new();
        let p = make_pred!['b', 'd'; 'x', 'z'];
        assert_eq!(ba.mk_not(&ba.mk_not(&p)), p);
        assert!(!ba.is_satisfiable(&ba.mk_not(&ba.mk_true())));
        assert_eq!(ba.mk_not(&IntervalPred::none()), ba.mk_true());
    }
    #[test]
    fn excluded_middle_over_surrogate_gap() {
        let ba = IntervalAlgebra::<char>::new();
        let p = IntervalPred::singleton('\u{D7FF}');
        let q = ba.mk_not(&p);
        assert!(ba.are_equivalent(&ba.mk_or(&p, &q), &ba.mk_true()));
        assert!(!ba.is_satisfiable(&ba.mk_and(&p, &q)));
        assert_eq!('\u{D7FF}'.next_up(), Some('\u{E000}'));
        assert_eq!('\u{E000}'.next_down(), Some('\u{D7FF}'));
    }
    #[test]
    fn witness_satisfies() {
        let ba = IntervalAlgebra::<char>::new();
        let p = make_pred!['m', 'q'; 'a', 'c'];
        let w = ba.generate_witness(&p).unwrap();
        assert!(ba.has_model(&p, &w));
        assert_eq!(ba.generate_witness(&IntervalPred::<char>::none()), None);
    }
    #[test]
    fn integer_domain() {
        let ba = IntervalAlgebra::<u8>::new();
        let low = IntervalPred::range(0u8, 127u8);
        let high = ba.mk_not(&low);
        assert_eq!(high, IntervalPred::range(128u8, 255u8));
        assert!(ba.are_equivalent(&ba.mk_or(&low, &high), &ba.mk_true()));
        assert_eq!(255u8.next_up(), None);
        assert_eq!(0u8.next_down(), None);
    }
}
