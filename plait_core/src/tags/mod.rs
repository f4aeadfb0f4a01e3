//! Tags that ship with the engine, registered under the `plait.core`
//! namespace.

pub(crate) mod expression;
mod if_else;
mod link;

pub use if_else::IfElse;
pub use link::Link;
