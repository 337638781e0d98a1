use serde::{Deserialize, Serialize};

use crate::{ContextValue, OtherFields};

/// A targeting rule tree, spelled on the wire exactly as its JSON form:
/// `{"ALL": [...]}`, `{"ANY": [...]}`, `{"NOT": {...}}`, or a comparison leaf such as
/// `{"EQ": {"field": "country_code", "values": ["DE", "FR"]}}`.
///
/// Evaluation never fails: a leaf over a missing field, a type mismatch, or an otherwise
/// malformed comparison evaluates to `false`. A targeting mistake must never take down the
/// decision path for an unrelated caller.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum TargetingRule {
    /// True iff every child is true. An empty list is true.
    #[serde(rename = "ALL")]
    All(Vec<TargetingRule>),
    /// True iff at least one child is true. An empty list is false.
    #[serde(rename = "ANY")]
    Any(Vec<TargetingRule>),
    /// Negation of the single child.
    #[serde(rename = "NOT")]
    Not(Box<TargetingRule>),
    /// Membership of the field's value in the candidate set.
    #[serde(rename = "EQ")]
    Eq(Comparison),
    /// Non-membership of the field's value in the candidate set. A missing field fails this
    /// check (there is no value to be distinct from the set).
    #[serde(rename = "NE")]
    Ne(Comparison),
    /// Numeric greater-than.
    #[serde(rename = "GT")]
    Gt(Comparison),
    /// Numeric greater-or-equal.
    #[serde(rename = "GE")]
    Ge(Comparison),
    /// Numeric less-than.
    #[serde(rename = "LT")]
    Lt(Comparison),
    /// Numeric less-or-equal.
    #[serde(rename = "LE")]
    Le(Comparison),
}

/// A comparison leaf: `field` against one or more candidate values.
///
/// Older hand-written rules use a singular `value` key; it is accepted as one more candidate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ContextValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ContextValue>,
}

impl TargetingRule {
    /// Evaluate the rule tree against the free-form context fields.
    pub fn eval(&self, fields: &OtherFields) -> bool {
        match self {
            TargetingRule::All(children) => children.iter().all(|child| child.eval(fields)),
            TargetingRule::Any(children) => children.iter().any(|child| child.eval(fields)),
            TargetingRule::Not(child) => !child.eval(fields),
            TargetingRule::Eq(comparison) => comparison.eval_membership(fields, true),
            TargetingRule::Ne(comparison) => comparison.eval_membership(fields, false),
            TargetingRule::Gt(comparison) => comparison.eval_ordered(fields, |a, b| a > b),
            TargetingRule::Ge(comparison) => comparison.eval_ordered(fields, |a, b| a >= b),
            TargetingRule::Lt(comparison) => comparison.eval_ordered(fields, |a, b| a < b),
            TargetingRule::Le(comparison) => comparison.eval_ordered(fields, |a, b| a <= b),
        }
    }
}

impl Comparison {
    fn candidates(&self) -> impl Iterator<Item = &ContextValue> {
        self.values.iter().chain(self.value.as_ref())
    }

    fn eval_membership(&self, fields: &OtherFields, has_to_be_member: bool) -> bool {
        self.try_membership(fields)
            .map(|is_member| is_member == has_to_be_member)
            .unwrap_or(false)
    }

    /// Membership of the field's value in the candidate set, `None` if the check cannot be
    /// applied (missing field, null, or no candidates).
    fn try_membership(&self, fields: &OtherFields) -> Option<bool> {
        let attribute = match fields.get(&self.field) {
            None | Some(ContextValue::Null) => return None,
            Some(value) => value,
        };
        if self.candidates().next().is_none() {
            return None;
        }
        Some(self.candidates().any(|candidate| candidate == attribute))
    }

    fn eval_ordered(&self, fields: &OtherFields, cmp: impl Fn(f64, f64) -> bool) -> bool {
        self.try_ordered(fields, cmp).unwrap_or(false)
    }

    /// Numeric comparison against the single candidate value, `None` if either side is
    /// non-numeric or the candidate count is not exactly one.
    fn try_ordered(&self, fields: &OtherFields, cmp: impl Fn(f64, f64) -> bool) -> Option<bool> {
        let attribute = fields.get(&self.field)?.as_f64()?;

        let mut candidates = self.candidates();
        let operand = candidates.next()?.as_f64()?;
        if candidates.next().is_some() {
            return None;
        }

        Some(cmp(attribute, operand))
    }
}
