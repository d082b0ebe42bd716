mod authorization_service;
mod config;
mod context;
mod jwt;
mod policy_evaluator;
mod query_scoper;
mod rbac_policy;
mod traits;

pub use authorization_service::*;
pub use config::*;
pub use context::*;
pub use jwt::*;
pub use policy_evaluator::*;
pub use query_scoper::*;
pub use rbac_policy::*;
pub use traits::*;
