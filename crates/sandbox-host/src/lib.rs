// Host-side implementations of the platform traits

pub mod filesystem;

pub use filesystem::HostFileSystem;
