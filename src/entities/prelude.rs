pub use super::forums::Entity as Forums;
pub use super::posts::Entity as Posts;
pub use super::topics::Entity as Topics;
pub use super::users::Entity as Users;
