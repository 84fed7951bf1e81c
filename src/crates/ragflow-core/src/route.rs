//! Typed routing outcomes
//!
//! Decision points in a graph select their successor by a string label. Raw
//! strings make exhaustiveness a run-time property; [`RouteOutcome`] closes
//! the label set instead. Each decision point gets its own enum, the enum
//! names every label it can produce, and
//! [`StateGraph::add_conditional_edge`](crate::StateGraph::add_conditional_edge)
//! checks the branch map against [`RouteOutcome::LABELS`] when the edge is
//! added - a missing or stray branch fails the build, not the run.

/// A closed enumeration of the outcomes a routing function can return.
///
/// Implementors are small fieldless enums, one per decision point. The label
/// strings are part of the graph's wire surface (they key the branch map and
/// show up in logs), so keep them stable.
///
/// # Examples
///
/// ```rust
/// use ragflow_core::RouteOutcome;
///
/// enum Verdict {
///     Accept,
///     Reject,
/// }
///
/// impl RouteOutcome for Verdict {
///     const LABELS: &'static [&'static str] = &["accept", "reject"];
///
///     fn label(&self) -> &'static str {
///         match self {
///             Verdict::Accept => "accept",
///             Verdict::Reject => "reject",
///         }
///     }
/// }
///
/// assert!(Verdict::LABELS.contains(&Verdict::Accept.label()));
/// ```
pub trait RouteOutcome: Send + 'static {
    /// Every label this outcome type can produce.
    ///
    /// [`label`](Self::label) must always return a member of this slice -
    /// that is what makes the build-time branch check sound.
    const LABELS: &'static [&'static str];

    /// The label for this particular outcome value.
    fn label(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Toggle {
        On,
        Off,
    }

    impl RouteOutcome for Toggle {
        const LABELS: &'static [&'static str] = &["on", "off"];

        fn label(&self) -> &'static str {
            match self {
                Toggle::On => "on",
                Toggle::Off => "off",
            }
        }
    }

    #[test]
    fn labels_cover_all_variants() {
        assert!(Toggle::LABELS.contains(&Toggle::On.label()));
        assert!(Toggle::LABELS.contains(&Toggle::Off.label()));
    }
}
