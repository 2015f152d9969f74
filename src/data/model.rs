use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// FilterCurve – one transmission curve resampled on the shared grid
// ---------------------------------------------------------------------------

/// A named transmission response, one sample per grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCurve {
    pub name: String,
    /// Transmission in [0, 1] (extrapolated points hold the fallback value).
    pub samples: Vec<f64>,
}

impl FilterCurve {
    pub fn new(name: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilterSet – all loaded curves, keyed by name
// ---------------------------------------------------------------------------

/// The loaded filters, iterated in a stable (name-sorted) order.
///
/// Stacks align their exponents positionally with this order, so the set is
/// never mutated while stacks built on it are alive: a reload replaces it.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    curves: BTreeMap<String, FilterCurve>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a curve. Returns `false` (and keeps the existing curve) when a
    /// filter with the same name is already present.
    pub fn insert(&mut self, curve: FilterCurve) -> bool {
        if self.curves.contains_key(&curve.name) {
            return false;
        }
        self.curves.insert(curve.name.clone(), curve);
        true
    }

    pub fn get(&self, name: &str) -> Option<&FilterCurve> {
        self.curves.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCurve> {
        self.curves.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.curves.keys().cloned().collect()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

impl FromIterator<FilterCurve> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterCurve>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for curve in iter {
            set.insert(curve);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins() {
        let mut set = FilterSet::new();
        assert!(set.insert(FilterCurve::new("bk7", vec![0.9, 0.9])));
        assert!(!set.insert(FilterCurve::new("bk7", vec![0.1, 0.1])));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("bk7").unwrap().samples, vec![0.9, 0.9]);
    }

    #[test]
    fn iterates_in_name_order() {
        let set: FilterSet = ["zns", "ar_coat", "longpass"]
            .into_iter()
            .map(|n| FilterCurve::new(n, vec![1.0]))
            .collect();
        assert_eq!(set.names(), vec!["ar_coat", "longpass", "zns"]);
        let order: Vec<&str> = set.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["ar_coat", "longpass", "zns"]);
    }
}
