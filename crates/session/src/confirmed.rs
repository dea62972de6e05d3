use serde::Serialize;

/// Ascending, duplicate-free set of accepted breakpoints.
///
/// Backed by a sorted `Vec`; lookups are binary searches under total
/// ordering. NaN is never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfirmedBreakpoints(Vec<f64>);

impl ConfirmedBreakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the sorted position; `false` if present or NaN
    pub fn insert(&mut self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        match self.position(value) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, value);
                true
            }
        }
    }

    /// Remove by value; `false` if absent
    pub fn remove(&mut self, value: f64) -> bool {
        match self.position(value) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<f64> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn contains(&self, value: f64) -> bool {
        self.position(value).is_ok()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest first, the order the matrix model consumes
    pub fn descending(&self) -> Vec<f64> {
        self.0.iter().rev().copied().collect()
    }

    fn position(&self, value: f64) -> Result<usize, usize> {
        self.0.binary_search_by(|probe| probe.total_cmp(&value))
    }
}

impl FromIterator<f64> for ConfirmedBreakpoints {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}
