//! API gateway: CORS, bearer-token authentication and prefix routing

pub mod auth;
pub mod cors;
pub mod proxy;
pub mod router;
pub mod routes;
mod server;

pub use auth::{AuthenticatedUser, auth_middleware};
pub use cors::cors_layer;
pub use router::{AppState, create_router};
pub use routes::{Route, RouteTable};
pub use server::Gateway;
