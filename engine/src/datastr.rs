//! Data structures used by algorithms.

pub mod graph;
pub mod network;
pub mod view;
