pub mod forum;
pub mod post;
pub mod topic;
pub mod user;
