// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Domain layer (business logic)
pub mod domain;

pub use domain::template;

// Application layer
pub mod api;
pub mod server;

// Client for other services
pub mod client;
