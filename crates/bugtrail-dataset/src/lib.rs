//! Temporal defect dataset construction.
//!
//! Mines a git history and an issue-tracker export into one timeline:
//! commits (with revert pairs removed), releases with half-open commit
//! windows, and bug tickets linked to their opening, fixed and affected
//! releases. The result is truncated to an observation horizon so later
//! feature computation is not biased by incomplete recent data.

pub mod features;
pub mod history;
pub mod linker;
pub mod pipeline;
pub mod reducer;
pub mod tickets;
pub mod timeline;

#[cfg(test)]
mod test_support;
