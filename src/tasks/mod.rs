//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: purges expired entries of in-process engines at a fixed interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_cleanup_task_from_config};
