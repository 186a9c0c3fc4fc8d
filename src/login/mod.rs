//! Login service: validates credentials and issues bearer tokens

pub mod handler;
pub mod password;
mod server;
pub mod store;

pub use handler::{LoginRequest, LoginResponse, LoginState, login_handler};
pub use password::{PasswordVerifier, hash_password};
pub use server::{LoginService, create_router};
pub use store::{PgUserStore, UserRecord, UserStore};
