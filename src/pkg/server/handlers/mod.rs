pub mod applicants;
pub mod candidates;
pub mod probes;
