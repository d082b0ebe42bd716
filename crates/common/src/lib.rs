pub mod auth;
pub mod domain;
pub mod garde;
pub mod postgres;
pub mod rpc;
pub mod telemetry;
pub mod wire;
