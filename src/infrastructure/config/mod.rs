mod settings;

pub use settings::{ApiConfig, DatabaseConfig, ServerConfig, Settings, StoreConfig};
