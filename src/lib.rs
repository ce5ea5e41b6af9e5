//! Cooktube backend: Google sign-in and stateless cookie sessions.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod token;
    pub mod ttl;
}

pub mod models {
    pub mod identity;
    pub mod session;
}

pub mod services {
    pub mod auth;
    pub mod cookies;
    pub mod oauth;
}

pub mod handlers {
    pub mod auth;
    pub mod health;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}
