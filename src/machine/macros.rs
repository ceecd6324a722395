//! Macros for declaring machine signals.

/// Declare signal constants, one bit each.
///
/// Handlers match by bitmask intersection, so independent event kinds need
/// disjoint bits. Bits are assigned in declaration order starting at
/// [`USER_SIG`](crate::core::USER_SIG). At most 32 signals fit.
///
/// # Example
///
/// ```
/// use hsm::signals;
///
/// signals! {
///     pub SIG_START,
///     pub SIG_STOP,
///     SIG_RESET,
/// }
///
/// assert_eq!(SIG_START, 0b001);
/// assert_eq!(SIG_STOP, 0b010);
/// assert_eq!(SIG_RESET, 0b100);
/// ```
#[macro_export]
macro_rules! signals {
    ($($vis:vis $name:ident),* $(,)?) => {
        $crate::signals!(@bit 0u32; $($vis $name,)*);
    };
    (@bit $shift:expr; $vis:vis $name:ident, $($rest_vis:vis $rest:ident,)*) => {
        $vis const $name: $crate::core::Signal = $crate::core::USER_SIG << ($shift);
        $crate::signals!(@bit $shift + 1u32; $($rest_vis $rest,)*);
    };
    (@bit $shift:expr;) => {};
}

#[cfg(test)]
mod tests {
    use crate::core::{Event, USER_SIG};

    signals! {
        SIG_ONE,
        SIG_TWO,
        SIG_THREE,
        SIG_FOUR,
    }

    #[test]
    fn signals_get_distinct_bits() {
        let all = [SIG_ONE, SIG_TWO, SIG_THREE, SIG_FOUR];
        assert_eq!(SIG_ONE, USER_SIG);
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.count_ones(), 1);
            for b in &all[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }

    #[test]
    fn combined_mask_covers_members() {
        let mask = SIG_TWO | SIG_FOUR;
        assert_ne!(Event::new(SIG_TWO).signal() & mask, 0);
        assert_eq!(Event::new(SIG_THREE).signal() & mask, 0);
    }

    #[test]
    fn signals_support_visibility() {
        signals! {
            pub SIG_LOCAL,
        }

        assert_eq!(SIG_LOCAL, 1);
    }
}
