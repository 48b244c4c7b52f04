//! Small helpers shared by the server and the binaries

pub mod version;

pub use version::{VERSION, get_version};
