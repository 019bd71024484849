//! Request middleware for Lattice Core.
pub mod auth;

pub use auth::{
    AuthConfig, AuthContext, AuthError, AuthLayer, Authenticator, Claims, CurrentUser,
};
