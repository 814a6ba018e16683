//! Process-wide run status.
//!
//! Held outside the node struct so signal handlers can flip it without
//! holding any handle. Transitions are monotone: the status only ever moves
//! forward through `Starting -> Running -> Stopping`.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum NodeStatus {
    Starting = 0,
    Running = 1,
    Stopping = 2,
}

static NODE_STATUS: AtomicU8 = AtomicU8::new(NodeStatus::Starting as u8);

pub fn node_status() -> NodeStatus {
    match NODE_STATUS.load(Ordering::SeqCst) {
        0 => NodeStatus::Starting,
        1 => NodeStatus::Running,
        _ => NodeStatus::Stopping,
    }
}

/// Advances the status, returning the value in effect afterwards.
///
/// A request to move backwards is ignored, so a late `Running` transition
/// cannot mask a shutdown already requested by a signal handler.
pub fn advance_node_status(status: NodeStatus) -> NodeStatus {
    NODE_STATUS.fetch_max(status as u8, Ordering::SeqCst);
    node_status()
}
