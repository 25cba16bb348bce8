//! Service layer: business logic orchestration.
//!
//! [`RegistryService`] runs one read-modify-write cycle per request against
//! the record store and applies the domain transition rules.

pub mod registry_service;

pub use registry_service::RegistryService;
