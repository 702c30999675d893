pub mod interval;
pub mod policy;
pub mod scores;
