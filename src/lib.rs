//! Job-board dashboard insights.
//!
//! Turns job and application records from the job-board backend into the
//! fixed-shape series that employer and job-seeker dashboards chart: six
//! trailing weeks of applications, six trailing months of postings, a
//! category breakdown and exact-match status tallies.

pub mod api;
pub mod breakdown;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod models;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod timeline;
