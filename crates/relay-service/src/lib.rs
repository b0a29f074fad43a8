//! # relay-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dto;
pub mod services;

// Re-export the service surface consumed by the API and gateway binaries
pub use dto::{
    AuthResponse, HealthResponse, LoginRequest, MessageHistoryResponse, MessageResponse,
    ReadinessResponse, RegisterRequest, UserResponse,
};
pub use services::{
    AuthService, MessageService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult,
};
