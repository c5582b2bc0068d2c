// src/watch/mod.rs

//! Live watching of the source tree.
//!
//! The platform watch APIs deliver two useful signals: content changes
//! on a watched file, and ambiguous "something about this name changed"
//! events on a watched directory (create vs delete vs rename is not
//! distinguished). [`watcher`] turns raw notify events into engine
//! events; [`tree`] owns the per-directory/per-file watch bookkeeping
//! and resolves the ambiguity by diffing each directory's last-known
//! listing against disk.

pub mod tree;
pub mod watcher;

pub use tree::{RenameAction, WatchTree};
pub use watcher::spawn_watcher;
