//! Stream combinators used to assemble the aggregated feed.
//!
//! - [`merge`] fans a fixed set of fallible streams into one, yielding values
//!   in arrival order and retiring inputs that finish or fail.
//! - [`deferred`] presents a pending operation (typically an HTTP request) as
//!   a stream that can be handed to [`merge`] before the operation resolves.
//!
//! Neither combinator spawns tasks: everything is driven by whoever polls the
//! merged stream, and dropping it cancels all work underneath.

mod deferred;
mod merge;

pub use deferred::{deferred, Deferred, Resolved};
pub use merge::{merge, Merge};
