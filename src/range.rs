//! Interval descriptors for range-restricted views.

use compare::Compare;
use std::ops::Bound;

/// An interval over one ordering dimension: an optional lower and an
/// optional upper bound, each inclusive or exclusive.
///
/// `Bounds` compose: intersecting two intervals yields the interval visible
/// through both, which is how nested sub-map views stack their restrictions.
///
/// # Examples
///
/// ```
/// use bitree::Bounds;
/// use compare::natural;
///
/// let bounds = Bounds::tail(2, true);
/// assert!(!bounds.contains(&natural(), &1));
/// assert!(bounds.contains(&natural(), &2));
/// assert!(bounds.contains(&natural(), &7));
/// ```
#[derive(Clone, Debug)]
pub struct Bounds<T> {
    lower: Bound<T>,
    upper: Bound<T>,
}

impl<T> Bounds<T> {
    /// The unrestricted interval.
    pub fn full() -> Self {
        Bounds { lower: Bound::Unbounded, upper: Bound::Unbounded }
    }

    /// An interval with the given lower and upper bounds.
    pub fn new(lower: Bound<T>, upper: Bound<T>) -> Self {
        Bounds { lower, upper }
    }

    /// The interval of everything up to `upper`.
    pub fn head(upper: T, inclusive: bool) -> Self {
        let upper = if inclusive { Bound::Included(upper) } else { Bound::Excluded(upper) };
        Bounds { lower: Bound::Unbounded, upper }
    }

    /// The interval of everything from `lower` on.
    pub fn tail(lower: T, inclusive: bool) -> Self {
        let lower = if inclusive { Bound::Included(lower) } else { Bound::Excluded(lower) };
        Bounds { lower, upper: Bound::Unbounded }
    }

    /// Checks if the interval has neither a lower nor an upper bound.
    pub fn is_full(&self) -> bool {
        matches!((&self.lower, &self.upper), (Bound::Unbounded, Bound::Unbounded))
    }

    /// Returns the lower bound by reference.
    pub fn lower(&self) -> Bound<&T> {
        self.lower.as_ref()
    }

    /// Returns the upper bound by reference.
    pub fn upper(&self) -> Bound<&T> {
        self.upper.as_ref()
    }

    /// Checks if `item` lies inside the interval under the given comparator.
    pub fn contains<C>(&self, cmp: &C, item: &T) -> bool
    where
        C: Compare<T>,
    {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(b) => cmp.compares_le(b, item),
            Bound::Excluded(b) => cmp.compares_lt(b, item),
        };

        above_lower
            && match &self.upper {
                Bound::Unbounded => true,
                Bound::Included(b) => cmp.compares_ge(b, item),
                Bound::Excluded(b) => cmp.compares_gt(b, item),
            }
    }

    /// Intersects two intervals, keeping the tighter bound on each end.
    ///
    /// Where both intervals bound the same end at the same point, the
    /// exclusive bound wins.
    pub fn intersect<C>(self, cmp: &C, other: Bounds<T>) -> Bounds<T>
    where
        C: Compare<T>,
    {
        Bounds {
            lower: tighter(cmp, self.lower, other.lower, false),
            upper: tighter(cmp, self.upper, other.upper, true),
        }
    }
}

/// Picks the tighter of two bounds on one end of an interval.
fn tighter<T, C>(cmp: &C, a: Bound<T>, b: Bound<T>, is_upper: bool) -> Bound<T>
where
    C: Compare<T>,
{
    let (at, bt) = match (&a, &b) {
        (Bound::Unbounded, _) => return b,
        (_, Bound::Unbounded) => return a,
        (Bound::Included(at) | Bound::Excluded(at), Bound::Included(bt) | Bound::Excluded(bt)) => {
            (at, bt)
        }
    };

    if cmp.compares_eq(at, bt) {
        // exclusive beats inclusive at the same point
        if matches!(a, Bound::Excluded(_)) {
            a
        } else {
            b
        }
    } else if cmp.compares_lt(at, bt) != is_upper {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::Bounds;
    use compare::natural;
    use std::ops::Bound;

    #[test]
    fn contains_respects_exclusivity() {
        let cmp = natural();
        let bounds = Bounds::new(Bound::Included(2), Bound::Excluded(5));

        assert!(!bounds.contains(&cmp, &1));
        assert!(bounds.contains(&cmp, &2));
        assert!(bounds.contains(&cmp, &4));
        assert!(!bounds.contains(&cmp, &5));
    }

    #[test]
    fn intersect_keeps_tighter_bounds() {
        let cmp = natural();
        let a = Bounds::new(Bound::Included(1), Bound::Included(8));
        let b = Bounds::new(Bound::Excluded(3), Bound::Unbounded);
        let both = a.intersect(&cmp, b);

        assert!(!both.contains(&cmp, &3));
        assert!(both.contains(&cmp, &4));
        assert!(both.contains(&cmp, &8));
        assert!(!both.contains(&cmp, &9));
    }

    #[test]
    fn exclusive_wins_ties() {
        let cmp = natural();
        let a = Bounds::new(Bound::Included(1), Bound::Included(5));
        let b = Bounds::new(Bound::Included(1), Bound::Excluded(5));
        let both = a.intersect(&cmp, b);

        assert!(!both.contains(&cmp, &5));
        assert!(both.contains(&cmp, &1));
    }
}
