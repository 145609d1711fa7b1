pub mod applicants;
pub mod candidates;
