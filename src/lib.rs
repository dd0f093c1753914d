//! OS City engine: the progression logic behind a walk-through tutorial on
//! virtual memory.
//!
//! A player moves between rooms (TLB, page table library, permission
//! chamber, RAM, disk, swap district), presses buttons and answers quizzes.
//! The engine turns those events into phase transitions plus a list of
//! effects (dialogue, sign updates, teleports, completion marks) that a
//! front end carries out.

pub mod config;
pub mod core;
pub mod runtime;
pub mod schema;
