//! JSON shapes returned by RPC procedures.

mod activity;
mod company;
mod contact;
mod project;
mod session;

pub use activity::*;
pub use company::*;
pub use contact::*;
pub use project::*;
pub use session::*;
