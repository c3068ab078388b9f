//! 专家分发：种类、线协议、HTTP 客户端与专家集合

pub mod client;
pub mod specialist;
pub mod types;

pub use client::DispatchClient;
pub use specialist::{RemoteSpecialist, Specialist, SpecialistSet};
pub use types::{InvokeRequest, SpecialistKind, SpecialistResponse};
