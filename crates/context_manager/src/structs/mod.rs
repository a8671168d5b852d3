pub mod branch_path;
pub mod message;
pub mod metadata;
pub mod node_manager;
pub mod session;
