//! Inclusive decimal ranges.
//!
//! Stepping is done in [`Decimal`] so quarter-diopter sequences never drift:
//! `-20.00..=20.00` by `0.25` yields exactly 161 values.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Lazily yields `start, start + step, ...` while the value is `<= end`.
///
/// Empty when `start > end` or `step <= 0`.
#[derive(Debug, Clone)]
pub struct DecimalSteps {
    next: Option<Decimal>,
    end: Decimal,
    step: Decimal,
}

#[must_use]
pub fn decimal_steps(start: Decimal, end: Decimal, step: Decimal) -> DecimalSteps {
    let next = (start <= end && step > Decimal::ZERO).then_some(start);
    DecimalSteps { next, end, step }
}

/// Collects [`decimal_steps`] into a vector.
#[must_use]
pub fn decimal_range(start: Decimal, end: Decimal, step: Decimal) -> Vec<Decimal> {
    decimal_steps(start, end, step).collect()
}

impl DecimalSteps {
    /// Values left to yield, or `None` when the count does not fit a `usize`
    /// or the span overflows `Decimal`.
    fn remaining(&self) -> Option<usize> {
        let Some(next) = self.next else {
            return Some(0);
        };
        if next > self.end {
            return Some(0);
        }
        self.end
            .checked_sub(next)?
            .checked_div(self.step)?
            .floor()
            .to_usize()?
            .checked_add(1)
    }
}

impl Iterator for DecimalSteps {
    type Item = Decimal;

    fn next(&mut self) -> Option<Decimal> {
        let current = self.next.filter(|v| *v <= self.end)?;
        self.next = current.checked_add(self.step);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining() {
            Some(n) => (n, Some(n)),
            None => (0, None),
        }
    }
}
