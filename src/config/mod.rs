/// Database connection and table creation
pub mod database;

/// Settings loaded from config file and environment
pub mod settings;

pub use settings::AppConfig;
