//! Composite parameter changes, carried from the control thread to the
//! audio thread over a bounded SPSC queue.
//!
//! Most parameters (bypass, per-band EQ gain, target LUFS, mode enums) are
//! plain atomics — see [`crate::meters::AtomicF32`] and the atomic fields
//! on [`crate::processor::Processor`] — read directly by the audio thread
//! with no queue involved. `Command` exists only for changes that must
//! land as one atomic unit: a whole EQ preset (ten band gains that must
//! not be seen half-applied) and noise-profile learning transitions
//! (several fields reset together).
//!
//! The queue never blocks the audio thread: [`CommandReceiver::drain`] is
//! called once at the top of `Processor::process` and pulls everything
//! currently queued without waiting.

use ringbuf::{Consumer, Producer, RingBuffer};

/// A composite change applied atomically at the top of the next processed
/// block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Replace all ten equalizer band gains (dB) at once.
    SetEqBands([f32; 10]),
    /// Begin accumulating a fresh noise profile from the next blocks.
    StartNoiseLearning,
    /// Stop accumulating; the profile learned so far becomes active.
    StopNoiseLearning,
    /// Reset every component's internal state (envelopes, filter delay
    /// lines, meters) without changing configuration.
    Reset,
}

/// Control-thread handle: pushes commands into the queue.
pub struct CommandSender {
    producer: Producer<Command>,
}

/// Audio-thread handle: drains commands out of the queue.
pub struct CommandReceiver {
    consumer: Consumer<Command>,
}

/// Build a bounded SPSC command channel with room for `capacity` pending
/// commands.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let rb = RingBuffer::<Command>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (CommandSender { producer }, CommandReceiver { consumer })
}

impl CommandSender {
    /// Push a command, never blocking. If the queue is full the oldest
    /// pending command is dropped to make room — the newest request for a
    /// given control action always wins over a stale one still in flight.
    pub fn send(&mut self, cmd: Command) {
        if self.producer.push(cmd).is_err() {
            let _ = self.producer.pop();
            let _ = self.producer.push(cmd);
        }
    }
}

impl CommandReceiver {
    /// Apply every pending command to `apply`, oldest first. Never
    /// allocates and never blocks; returns immediately once the queue is
    /// empty.
    pub fn drain(&mut self, mut apply: impl FnMut(Command)) {
        while let Some(cmd) = self.consumer.pop() {
            apply(cmd);
        }
    }
}
