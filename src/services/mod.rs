pub mod user_service;
pub mod user_service_impl;

pub use user_service::{
    AuditHistoryDto, CreateUserRequest, PartialUpdateUserRequest, UpdateUserRequest, UserDto,
    UserError, UserService,
};
pub use user_service_impl::SqlUserService;
