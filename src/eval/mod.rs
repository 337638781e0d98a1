//! Decision evaluation: the pure [`choose`] function and the [`Decider`] facade.
mod decider;
mod eval_choice;

pub use decider::Decider;
pub use eval_choice::{choose, Decision};
