use std::fmt;

use super::grid::WavelengthGrid;
use super::model::FilterSet;

// ---------------------------------------------------------------------------
// Combiner
// ---------------------------------------------------------------------------

/// Elementwise `Π curve_f ^ exponent_f` over the filter set.
///
/// `exponents` is aligned with the set's iteration order. When the lengths
/// disagree the state is inconsistent and the neutral curve (all ones) is
/// returned instead.
pub fn combine(grid: &WavelengthGrid, filters: &FilterSet, exponents: &[u32]) -> Vec<f64> {
    let mut result = grid.ones();
    if filters.len() != exponents.len() {
        log::warn!(
            "Exponent count ({}) does not match filter count ({}); using neutral curve",
            exponents.len(),
            filters.len()
        );
        return result;
    }

    for (curve, &exponent) in filters.iter().zip(exponents) {
        if exponent == 0 {
            continue;
        }
        let power = i32::try_from(exponent).unwrap_or(i32::MAX);
        for (r, &s) in result.iter_mut().zip(&curve.samples) {
            *r *= s.powi(power);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// Session-unique handle for a stack. Never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackId(pub u64);

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named combination of filters, each raised to its own exponent.
#[derive(Debug, Clone)]
pub struct Stack {
    pub id: StackId,
    pub name: String,
    exponents: Vec<u32>,
    /// Cached result of [`combine`]; refreshed by [`Stack::recombine`].
    curve: Vec<f64>,
}

impl Stack {
    /// A stack with every exponent at zero (combined curve all ones).
    pub fn new(id: StackId, name: impl Into<String>, grid: &WavelengthGrid, filters: &FilterSet) -> Self {
        let mut stack = Self {
            id,
            name: name.into(),
            exponents: vec![0; filters.len()],
            curve: Vec::new(),
        };
        stack.recombine(grid, filters);
        stack
    }

    pub fn exponents(&self) -> &[u32] {
        &self.exponents
    }

    pub fn exponent(&self, index: usize) -> Option<u32> {
        self.exponents.get(index).copied()
    }

    pub fn curve(&self) -> &[f64] {
        &self.curve
    }

    /// Returns the new exponent, or `None` if `index` is out of range.
    pub fn increment(&mut self, index: usize) -> Option<u32> {
        let e = self.exponents.get_mut(index)?;
        *e = e.saturating_add(1);
        Some(*e)
    }

    /// Floored at zero. Returns the new exponent, or `None` if `index` is out of range.
    pub fn decrement(&mut self, index: usize) -> Option<u32> {
        let e = self.exponents.get_mut(index)?;
        *e = e.saturating_sub(1);
        Some(*e)
    }

    pub fn set_exponent(&mut self, index: usize, value: u32) -> Option<u32> {
        let e = self.exponents.get_mut(index)?;
        *e = value;
        Some(value)
    }

    pub fn recombine(&mut self, grid: &WavelengthGrid, filters: &FilterSet) {
        self.curve = combine(grid, filters, &self.exponents);
    }

    /// Filters with a non-zero exponent, as `name^e` terms.
    pub fn formula(&self, filters: &FilterSet) -> String {
        let terms: Vec<String> = filters
            .iter()
            .zip(&self.exponents)
            .filter(|(_, &e)| e > 0)
            .map(|(c, &e)| if e == 1 { c.name.clone() } else { format!("{}^{e}", c.name) })
            .collect();
        if terms.is_empty() {
            "1".to_string()
        } else {
            terms.join(" × ")
        }
    }
}
