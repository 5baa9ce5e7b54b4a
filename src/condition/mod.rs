//! Predicates over collected answers and the first-match branch resolution used
//! by conditional nodes.

pub mod evaluator;
pub mod formatter;
pub mod predicate;
pub mod trace;
pub mod value;

pub use evaluator::*;
pub use formatter::*;
pub use predicate::*;
pub use trace::*;
pub use value::*;
