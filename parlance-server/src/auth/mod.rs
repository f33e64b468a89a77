pub mod middleware;

pub use middleware::{
    AuthToken, CurrentUser, SESSION_COOKIE, Viewer, optional_auth_middleware,
};
