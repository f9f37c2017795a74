//! Background Tasks Module
//!
//! Optional maintenance tasks; nothing here is required for correctness.

mod sweeper;

pub use sweeper::spawn_sweeper_task;
