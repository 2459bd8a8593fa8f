#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod bench;
pub mod cancel;
pub mod classify;
pub mod parallel;
pub mod prefix_index;
pub mod search;
pub mod square;
