pub mod prelude;

pub mod forums;
pub mod posts;
pub mod topics;
pub mod users;
