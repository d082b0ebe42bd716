mod activity;
mod association;
mod company;
mod contact;
mod contact_relation;
mod policy;
mod project;
mod repositories;
mod result;
mod scope;
mod user;

pub use activity::*;
pub use association::*;
pub use company::*;
pub use contact::*;
pub use contact_relation::*;
pub use policy::*;
pub use project::*;
pub use repositories::*;
pub use result::*;
pub use scope::*;
pub use user::*;
