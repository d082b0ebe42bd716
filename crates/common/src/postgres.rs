mod activity_repository;
mod association_repository;
mod client;
mod company_repository;
mod config;
mod contact_relation_repository;
mod contact_repository;
mod policy_repository;
mod project_repository;
mod query;
mod repositories;
mod user_repository;

pub use activity_repository::*;
pub use association_repository::*;
pub use client::*;
pub use company_repository::*;
pub use config::*;
pub use contact_relation_repository::*;
pub use contact_repository::*;
pub use policy_repository::*;
pub use project_repository::*;
pub(crate) use query::*;
pub use repositories::*;
pub use user_repository::*;
