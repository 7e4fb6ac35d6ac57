//! Decision model: the verdict of an allocation decider.
//!
//! A decision is either a single vote (`YES` / `NO` / `THROTTLE` / `ALWAYS`)
//! or a `Multi` aggregate of the votes of several deciders.
//!
//! # Sentinels
//! `Decision::YES`, `Decision::NO`, `Decision::THROTTLE` and `Decision::ALWAYS`
//! are constants without label or explanation. Deciders return them on the
//! hot path so no allocation happens unless an explanation is requested.
//!
//! # Why lazy explanations
//! An [`Explanation`] stores its `{}` template and the arguments already
//! turned into strings. The message is assembled only on `Display` or when
//! the explain document is serialized. A template whose placeholder count
//! differs from its argument count panics at construction.
//!
//! # Aggregation
//! [`Multi`] keeps its votes in insertion order and never stores `ALWAYS`.
//! Its kind is the strongest vote: `NO` beats `THROTTLE`, `THROTTLE` beats
//! `YES`. An empty `Multi` is `YES`.
//!
//! # Wire shape
//! A single vote serializes as `{"decision", "decider", "explanation"}` with
//! the last two omitted when absent. A `Multi` serializes as its kind plus
//! the list of its votes.

use std::borrow::Cow;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// The kind of a vote.
///
/// `Always` means "this decider does not vote on the question"; it is never
/// stored in a [`Multi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Yes,
    No,
    Throttle,
    Always,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Yes => "YES",
            DecisionKind::No => "NO",
            DecisionKind::Throttle => "THROTTLE",
            DecisionKind::Always => "ALWAYS",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{}`-placeholder template and its arguments.
///
/// The arguments are captured as strings when the explanation is built, the
/// final message is only assembled when it is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    template: Cow<'static, str>,
    args: Vec<String>,
}

impl Explanation {
    /// Build an explanation.
    ///
    /// # Panics
    /// When the number of `{}` placeholders differs from `args.len()`. A
    /// mismatched template is a bug in the calling decider.
    pub fn new(template: impl Into<Cow<'static, str>>, args: &[&dyn fmt::Display]) -> Self {
        let template = template.into();
        let placeholders = template.matches("{}").count();
        assert_eq!(
            placeholders,
            args.len(),
            "explanation template {template:?} has {placeholders} placeholder(s) but {} argument(s) were given",
            args.len()
        );
        Self {
            template,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.template.split("{}");
        let mut args = self.args.iter();
        if let Some(head) = parts.next() {
            f.write_str(head)?;
        }
        for part in parts {
            if let Some(arg) = args.next() {
                f.write_str(arg)?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

/// One decider's vote, optionally labelled and explained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Single {
    kind: DecisionKind,
    label: Option<Cow<'static, str>>,
    explanation: Option<Explanation>,
}

impl Single {
    const fn sentinel(kind: DecisionKind) -> Self {
        Self {
            kind,
            label: None,
            explanation: None,
        }
    }

    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn explanation(&self) -> Option<&Explanation> {
        self.explanation.as_ref()
    }
}

/// An ordered collection of votes.
///
/// The overall kind is `NO` if any child is `NO`, otherwise `THROTTLE` if any
/// child is `THROTTLE`, otherwise `YES`. An empty `Multi` is `YES`: when no
/// decider votes the operation is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multi {
    decisions: Vec<Decision>,
}

impl Multi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vote. `ALWAYS` votes are dropped.
    pub fn add(&mut self, decision: Decision) -> &mut Self {
        if decision.kind() != DecisionKind::Always {
            self.decisions.push(decision);
        }
        self
    }

    pub fn kind(&self) -> DecisionKind {
        let mut throttled = false;
        for decision in &self.decisions {
            match decision.kind() {
                DecisionKind::No => return DecisionKind::No,
                DecisionKind::Throttle => throttled = true,
                DecisionKind::Yes | DecisionKind::Always => {}
            }
        }
        if throttled {
            DecisionKind::Throttle
        } else {
            DecisionKind::Yes
        }
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Multi {
    type Item = &'a Decision;
    type IntoIter = std::slice::Iter<'a, Decision>;

    fn into_iter(self) -> Self::IntoIter {
        self.decisions.iter()
    }
}

/// The result of asking one or more deciders a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Single(Single),
    Multi(Multi),
}

impl Decision {
    pub const YES: Decision = Decision::Single(Single::sentinel(DecisionKind::Yes));
    pub const NO: Decision = Decision::Single(Single::sentinel(DecisionKind::No));
    pub const THROTTLE: Decision = Decision::Single(Single::sentinel(DecisionKind::Throttle));
    pub const ALWAYS: Decision = Decision::Single(Single::sentinel(DecisionKind::Always));

    /// The shared constant for `kind`.
    pub const fn of(kind: DecisionKind) -> Decision {
        match kind {
            DecisionKind::Yes => Decision::YES,
            DecisionKind::No => Decision::NO,
            DecisionKind::Throttle => Decision::THROTTLE,
            DecisionKind::Always => Decision::ALWAYS,
        }
    }

    /// A labelled vote with a rendered-on-demand explanation.
    ///
    /// # Panics
    /// See [`Explanation::new`].
    pub fn single(
        kind: DecisionKind,
        label: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        args: &[&dyn fmt::Display],
    ) -> Decision {
        Decision::Single(Single {
            kind,
            label: Some(label.into()),
            explanation: Some(Explanation::new(template, args)),
        })
    }

    pub fn multi() -> Multi {
        Multi::new()
    }

    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Single(single) => single.kind,
            Decision::Multi(multi) => multi.kind(),
        }
    }

    pub fn is_no(&self) -> bool {
        self.kind() == DecisionKind::No
    }

    /// Label of a single vote; a `Multi` has none.
    pub fn label(&self) -> Option<&str> {
        match self {
            Decision::Single(single) => single.label(),
            Decision::Multi(_) => None,
        }
    }

    /// Rendered explanation of a single vote.
    pub fn explanation(&self) -> Option<String> {
        match self {
            Decision::Single(single) => single.explanation.as_ref().map(Explanation::render),
            Decision::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&Multi> {
        match self {
            Decision::Multi(multi) => Some(multi),
            Decision::Single(_) => None,
        }
    }
}

impl From<Multi> for Decision {
    fn from(multi: Multi) -> Self {
        Decision::Multi(multi)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Single(single) => {
                write!(f, "{}", single.kind)?;
                if let Some(label) = &single.label {
                    write!(f, "({label})")?;
                }
                if let Some(explanation) = &single.explanation {
                    write!(f, ": {explanation}")?;
                }
                Ok(())
            }
            Decision::Multi(multi) if multi.is_empty() => write!(f, "{}", multi.kind()),
            Decision::Multi(multi) => {
                for (i, decision) in multi.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{decision}")?;
                }
                Ok(())
            }
        }
    }
}

/// Explain document:
/// `{"decision": "NO", "decider": "...", "explanation": "..."}` for a single
/// vote, `{"decision": "NO", "decisions": [...]}` for a multi.
impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Decision::Single(single) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("decision", &single.kind)?;
                if let Some(label) = &single.label {
                    map.serialize_entry("decider", label)?;
                }
                if let Some(explanation) = &single.explanation {
                    map.serialize_entry("explanation", &explanation.render())?;
                }
                map.end()
            }
            Decision::Multi(multi) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("decision", &multi.kind())?;
                map.serialize_entry("decisions", &multi.decisions)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn sentinels_have_no_label_or_explanation() {
        for kind in [
            DecisionKind::Yes,
            DecisionKind::No,
            DecisionKind::Throttle,
            DecisionKind::Always,
        ] {
            let decision = Decision::of(kind);
            assert_eq!(decision.kind(), kind);
            assert_eq!(decision.label(), None);
            assert_eq!(decision.explanation(), None);
        }
    }

    #[test]
    fn single_renders_explanation() {
        let decision = Decision::single(
            DecisionKind::No,
            "same_shard",
            "shard {} already allocated on node {}",
            &[&"[idx][0]", &"n1"],
        );
        assert_eq!(decision.kind(), DecisionKind::No);
        assert_eq!(decision.label(), Some("same_shard"));
        assert_eq!(
            decision.explanation().as_deref(),
            Some("shard [idx][0] already allocated on node n1")
        );
        assert_eq!(
            decision.to_string(),
            "NO(same_shard): shard [idx][0] already allocated on node n1"
        );
    }

    #[test]
    #[should_panic(expected = "placeholder")]
    fn mismatched_template_fails_fast() {
        let _ = Decision::single(DecisionKind::Yes, "x", "{} and {}", &[&1]);
    }

    #[test]
    fn empty_multi_allows() {
        let multi = Decision::multi();
        assert!(multi.is_empty());
        assert_eq!(multi.kind(), DecisionKind::Yes);
        assert_eq!(Decision::from(multi).to_string(), "YES");
    }

    #[test]
    fn multi_drops_always_votes() {
        let mut multi = Decision::multi();
        multi
            .add(Decision::ALWAYS)
            .add(Decision::YES)
            .add(Decision::ALWAYS);
        assert_eq!(multi.len(), 1);
        assert_eq!(multi.kind(), DecisionKind::Yes);
    }

    #[rstest]
    #[case::all_yes(&[DecisionKind::Yes, DecisionKind::Yes], DecisionKind::Yes)]
    #[case::throttle_beats_yes(&[DecisionKind::Yes, DecisionKind::Throttle], DecisionKind::Throttle)]
    #[case::no_beats_throttle(&[DecisionKind::Throttle, DecisionKind::No, DecisionKind::Yes], DecisionKind::No)]
    #[case::only_always(&[DecisionKind::Always], DecisionKind::Yes)]
    fn multi_takes_the_weakest_vote(#[case] votes: &[DecisionKind], #[case] expected: DecisionKind) {
        let mut multi = Decision::multi();
        for kind in votes {
            multi.add(Decision::of(*kind));
        }
        assert_eq!(multi.kind(), expected);
    }

    #[test]
    fn nested_multi_contributes_its_overall_kind() {
        let mut inner = Decision::multi();
        inner.add(Decision::THROTTLE);
        let mut outer = Decision::multi();
        outer.add(Decision::YES).add(inner.into());
        assert_eq!(outer.kind(), DecisionKind::Throttle);
    }

    #[test]
    fn explain_document_lists_every_vote() {
        let mut multi = Decision::multi();
        multi
            .add(Decision::single(DecisionKind::Yes, "enable", "allocation is enabled", &[]))
            .add(Decision::NO);
        let value = serde_json::to_value(Decision::from(multi)).unwrap();
        assert_eq!(value["decision"], "NO");
        assert_eq!(value["decisions"][0]["decider"], "enable");
        assert_eq!(value["decisions"][0]["explanation"], "allocation is enabled");
        assert_eq!(value["decisions"][1], serde_json::json!({ "decision": "NO" }));
    }
}
