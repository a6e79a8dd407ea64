//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the user record and its per-user lists, their inputs and their validation rules, and the
//! injectable capabilities (password hashing, id generation) the user store relies on.

pub mod constants;
pub mod error;
pub mod id;
pub mod list;
pub mod password;
pub mod user;
pub mod validation;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use id::{IdGenerator, UuidGenerator};
pub use list::{CreateList, UserList};
pub use password::{Argon2Hasher, PasswordHasher};
pub use user::{
    CreateUser, IdentityScheme, UpdateUser, User, UserChanges, UserFilter, UserResponse,
};
pub use validation::FieldError;
