use std::fmt;

use uuid::Uuid;

/// Identifies one invocation of the verifier (a suite or a single scenario).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlates backend log lines with the step that issued them.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Derives a stable id for step `index` of run `run`.
    pub fn for_step(run: &RunId, index: usize) -> Self {
        Self(format!("{}#{}", run.0, index))
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_ids_are_derived_from_run() {
        let run = RunId("run-1".into());
        assert_eq!(ActionId::for_step(&run, 3).to_string(), "run-1#3");
    }

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
