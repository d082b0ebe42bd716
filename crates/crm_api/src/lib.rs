pub mod crm_api;
pub mod domain;
pub mod rpc;

pub use crm_api::*;
pub use domain::*;
pub use rpc::*;
