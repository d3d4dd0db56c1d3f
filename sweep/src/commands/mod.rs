/// Login and logout handlers
pub mod auth;

/// Clean command handlers and report
pub mod clean;

/// Version command handlers
pub mod version;
