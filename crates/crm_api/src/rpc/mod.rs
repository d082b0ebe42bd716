pub mod activity_handler;
pub mod company_handler;
pub mod contact_handler;
pub mod input;
pub mod project_handler;
pub mod router;
pub mod session_handler;
pub mod state;

pub use input::*;
pub use router::*;
pub use state::*;
