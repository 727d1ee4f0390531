//! Run results: findings, the result artifact and its synthesizer.

mod finding;
mod result;
mod synthesizer;

pub use finding::{canned_findings, Finding, Severity};
pub use result::{RunResult, StageTiming};
pub use synthesizer::{CannedResultSynthesizer, ResultSynthesizer};

#[cfg(test)]
pub use synthesizer::MockResultSynthesizer;
