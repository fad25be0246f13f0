pub mod adapters;
pub mod services;
pub mod task_groups;

pub use task_groups::{TaskHandle, ThreadGroupRegistry};
