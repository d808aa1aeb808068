//! Cloud infrastructure owned by the add-on

pub mod stack;

pub use stack::{CloudFormationStacks, StackApi, StackRequest, ensure_stack, read_template};
