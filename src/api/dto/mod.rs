//! Data Transfer Objects for REST response serialization.

pub mod participant_dto;

pub use participant_dto::*;
