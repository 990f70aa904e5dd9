pub mod handoff;
pub mod leg;
pub mod order;
