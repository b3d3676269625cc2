//! Bounded command priority queue.
//!
//! Network listeners push commands here as they arrive; the control loop
//! pops at most one per iteration. Stop is promoted to
//! [`CommandSource::Emergency`] so it is always served first, even when the
//! queue is full. A Stop also cancels every motion command queued before
//! it; overrides survive.
//!
//! ```rust
//! use rs_drawbridge::priority::CommandQueue;
//! use rs_drawbridge::{BridgeCommand, CommandSource, PrioritizedCommand};
//!
//! let mut queue: CommandQueue<4> = CommandQueue::new();
//! assert!(queue.push(PrioritizedCommand::new(BridgeCommand::Open, CommandSource::Udp, 0)));
//! assert!(queue.push(PrioritizedCommand::new(BridgeCommand::OverrideBoatClear, CommandSource::Udp, 1)));
//! assert!(queue.push(PrioritizedCommand::new(BridgeCommand::Stop, CommandSource::Udp, 5)));
//!
//! assert_eq!(queue.pop().unwrap().command, BridgeCommand::Stop);
//! assert_eq!(queue.pop().unwrap().command, BridgeCommand::OverrideBoatClear);
//! assert!(queue.pop().is_none());
//! ```

use crate::commands::{CommandSource, CommandType, PrioritizedCommand};
use heapless::binary_heap::{BinaryHeap, Max};

/// Command queue with priority ordering.
///
/// Uses a max-heap to always serve the highest-priority command first.
///
/// # Capacity
///
/// The queue has a fixed capacity `N` (const generic). When full:
/// - Higher priority commands displace the lowest priority item
/// - Equal or lower priority commands are rejected
pub struct CommandQueue<const N: usize> {
    heap: BinaryHeap<PrioritizedCommand, Max, N>,
}

impl<const N: usize> CommandQueue<N> {
    /// Creates a new empty command queue with capacity N.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Push a command onto the queue.
    ///
    /// If the queue is full, only accepts if higher priority than lowest in queue.
    /// When accepted, the lowest priority item is dropped to make room.
    ///
    /// A Stop first drops every queued motion command, so nothing queued
    /// before it can move the deck afterwards.
    #[must_use]
    pub fn push(&mut self, cmd: PrioritizedCommand) -> bool {
        if cmd.command.is_stop() {
            self.cancel_motion();
        }

        if self.heap.len() < self.heap.capacity() {
            return self.heap.push(cmd).is_ok();
        }

        let new_priority = cmd.priority();

        let mut items: heapless::Vec<PrioritizedCommand, N> = heapless::Vec::new();
        while let Some(item) = self.heap.pop() {
            let _ = items.push(item);
        }

        // Heap pops in descending order, so the last item is the weakest.
        let weakest = items.last().map(|c| c.priority());

        match weakest {
            Some(min_p) if new_priority > min_p => {
                let _ = items.pop();
                for item in items {
                    let _ = self.heap.push(item);
                }
                log::debug!(
                    "command queue full, displaced a {:?} command for {}",
                    min_p.0,
                    cmd.command.as_str()
                );
                self.heap.push(cmd).is_ok()
            }
            _ => {
                for item in items {
                    let _ = self.heap.push(item);
                }
                false
            }
        }
    }

    /// Pop the highest priority command.
    pub fn pop(&mut self) -> Option<PrioritizedCommand> {
        self.heap.pop()
    }

    /// Peek at the highest priority command without removing it.
    pub fn peek(&self) -> Option<&PrioritizedCommand> {
        self.heap.peek()
    }

    /// Drop every command whose effective source is below `source`.
    pub fn clear_below(&mut self, source: CommandSource) {
        let mut temp: BinaryHeap<PrioritizedCommand, Max, N> = BinaryHeap::new();
        while let Some(cmd) = self.heap.pop() {
            if cmd.priority().0 >= source {
                let _ = temp.push(cmd);
            }
        }
        self.heap = temp;
    }

    /// Drop every queued Open, Close, Toggle and Rearm.
    pub fn cancel_motion(&mut self) {
        let before = self.heap.len();
        let mut temp: BinaryHeap<PrioritizedCommand, Max, N> = BinaryHeap::new();
        while let Some(cmd) = self.heap.pop() {
            if cmd.command.command_type() != CommandType::Motion {
                let _ = temp.push(cmd);
            }
        }
        self.heap = temp;

        let dropped = before - self.heap.len();
        if dropped > 0 {
            log::debug!("stop cancelled {} queued motion command(s)", dropped);
        }
    }

    /// Clear all commands.
    pub fn clear(&mut self) {
        while self.heap.pop().is_some() {}
    }

    /// Returns the number of commands in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns true if the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.heap.len() == self.heap.capacity()
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
