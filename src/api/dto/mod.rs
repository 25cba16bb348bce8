//! Request parameter types for the master server protocol.

pub mod master_dto;

pub use master_dto::{MasterParams, MasterRequest};
