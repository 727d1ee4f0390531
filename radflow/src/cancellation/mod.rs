//! Cooperative cancellation for pipeline runs.
//!
//! Every run owns one [`CancellationToken`]; resetting or superseding the run
//! cancels it, and the stage executor checks it before applying each tick.

mod token;

pub use token::CancellationToken;
