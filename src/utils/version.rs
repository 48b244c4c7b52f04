//! Version information

/// Crate version as set in Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string reported by `/ping` and `--version`
pub fn get_version() -> &'static str {
    VERSION
}
