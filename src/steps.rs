//! # Processing-step registry.
//!
//! Ordered list of enabled processing steps, consulted when building new
//! controllers (see [`Controller::from_steps`](crate::Controller::from_steps)).
//! It has no scheduling logic and no deduplication: adding the same step twice
//! runs it twice.
//!
//! The registry is plain data. Share it behind whatever lock the owning layer
//! already uses; one writer at a time is expected.

/// Ordered sequence of step descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRegistry<S> {
    steps: Vec<S>,
}

impl<S> Default for StepRegistry<S> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<S> StepRegistry<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step at the end.
    pub fn add(&mut self, step: S) {
        self.steps.push(step);
    }

    /// Removes every step.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Replaces the whole list, keeping the given order.
    pub fn replace_all(&mut self, steps: impl IntoIterator<Item = S>) {
        self.steps = steps.into_iter().collect();
    }

    /// Steps in registry order.
    pub fn list(&self) -> &[S] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<S: PartialEq> StepRegistry<S> {
    /// Removes the first occurrence of `step`. Returns `false` if absent.
    pub fn remove(&mut self, step: &S) -> bool {
        match self.steps.iter().position(|s| s == step) {
            Some(idx) => {
                self.steps.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl<S> FromIterator<S> for StepRegistry<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a, S> IntoIterator for &'a StepRegistry<S> {
    type Item = &'a S;
    type IntoIter = std::slice::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
