//! Two-state protocol for the asynchronous pick readback.
//!
//! A transfer is either `Idle` or `Pending`. Each frame the resolver first
//! tries to complete the pending transfer, which never blocks: if the GPU
//! has not produced the texel yet, the previous result is kept and the
//! transfer stays pending. Only an idle channel may issue a new transfer,
//! so at most one readback is ever outstanding.

use crate::error::ManipDrawError;
use crate::picking::PickId;

/// Outcome of one non-blocking poll of a readback slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRead {
    /// The staging buffer was mapped; carries the raw texel.
    Ready(u16),
    /// The GPU has not finished the copy yet.
    NotReady,
    /// The mapping was rejected (e.g. the device was lost).
    Failed,
}

/// A single-texel staging buffer that can be read back asynchronously.
pub trait ReadbackSlot {
    /// Request the asynchronous map of the slot. Called once per transfer,
    /// after the copy into the slot has been submitted.
    fn begin_read(&mut self);

    /// Poll the map requested by [`begin_read`](Self::begin_read) without
    /// blocking. A `Ready` result also releases the mapping.
    fn try_read(&mut self) -> SlotRead;
}

/// Transfer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    /// No transfer outstanding.
    #[default]
    Idle,
    /// A read was issued and its result has not been collected.
    Pending,
}

/// What [`TransferChannel::try_complete`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Nothing was in flight.
    Idle,
    /// The transfer is still in flight; the previous pick is retained.
    Waiting,
    /// The transfer finished and produced a new pick.
    Resolved(Option<PickId>),
    /// The transfer was dropped; the previous pick is retained.
    Failed,
}

/// Single-slot readback channel with its resolved pick.
pub struct TransferChannel<S> {
    slot: S,
    state: TransferState,
    resolved: Option<PickId>,
    /// Consecutive polls that found the transfer still pending.
    waited_polls: u32,
    /// Polls after which a pending transfer is reported as stalled
    /// (0 = never).
    stall_warn_polls: u32,
}

impl<S: ReadbackSlot> TransferChannel<S> {
    /// Create an idle channel over `slot` with nothing resolved.
    pub fn new(slot: S, stall_warn_polls: u32) -> Self {
        Self {
            slot,
            state: TransferState::Idle,
            resolved: None,
            waited_polls: 0,
            stall_warn_polls,
        }
    }

    /// Current transfer state.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Whether a transfer is outstanding.
    pub fn is_pending(&self) -> bool {
        self.state == TransferState::Pending
    }

    /// The most recently resolved pick.
    pub fn resolved(&self) -> Option<PickId> {
        self.resolved
    }

    /// Number of consecutive polls the current transfer has been waiting.
    pub fn waited_polls(&self) -> u32 {
        self.waited_polls
    }

    /// The underlying slot.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    #[cfg(test)]
    pub(crate) fn slot_mut(&mut self) -> &mut S {
        &mut self.slot
    }

    /// Collect the pending transfer if the GPU has finished it.
    ///
    /// No-op while idle. Never blocks.
    pub fn try_complete(&mut self) -> Completion {
        if self.state == TransferState::Idle {
            return Completion::Idle;
        }

        match self.slot.try_read() {
            SlotRead::Ready(raw) => {
                self.resolved = PickId::decode(raw);
                self.state = TransferState::Idle;
                self.waited_polls = 0;
                Completion::Resolved(self.resolved)
            }
            SlotRead::NotReady => {
                self.waited_polls = self.waited_polls.saturating_add(1);
                if self.stall_warn_polls > 0
                    && self.waited_polls == self.stall_warn_polls
                {
                    log::warn!(
                        "pick readback pending for {} frames; hover state is \
                         frozen at {:?}",
                        self.waited_polls,
                        self.resolved
                    );
                }
                Completion::Waiting
            }
            SlotRead::Failed => {
                log::warn!("pick readback mapping failed; keeping last pick");
                self.state = TransferState::Idle;
                self.waited_polls = 0;
                Completion::Failed
            }
        }
    }

    /// Start a new transfer. The copy into the slot must already be
    /// submitted.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::TransferInFlight`] if the previous transfer
    /// has not been completed.
    pub fn issue(&mut self) -> Result<(), ManipDrawError> {
        if self.state == TransferState::Pending {
            return Err(ManipDrawError::TransferInFlight);
        }
        self.slot.begin_read();
        self.state = TransferState::Pending;
        self.waited_polls = 0;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Scripted slot: `begin_read` latches the texel the GPU would have
    /// copied, and `try_read` reports it after `latency` polls.
    #[derive(Default)]
    pub(crate) struct FakeSlot {
        pub(crate) texel: u16,
        pub(crate) latency: u32,
        pub(crate) fail_next: bool,
        in_flight: Option<(u16, u32)>,
        pub(crate) begin_calls: u32,
        pub(crate) script: VecDeque<SlotRead>,
    }

    impl FakeSlot {
        pub(crate) fn with_latency(latency: u32) -> Self {
            Self {
                texel: PickId::NONE_RAW,
                latency,
                ..Self::default()
            }
        }
    }

    impl ReadbackSlot for FakeSlot {
        fn begin_read(&mut self) {
            self.begin_calls += 1;
            self.in_flight = Some((self.texel, self.latency));
        }

        fn try_read(&mut self) -> SlotRead {
            if let Some(scripted) = self.script.pop_front() {
                return scripted;
            }
            if std::mem::take(&mut self.fail_next) {
                self.in_flight = None;
                return SlotRead::Failed;
            }
            match self.in_flight.take() {
                Some((texel, 0)) => SlotRead::Ready(texel),
                Some((texel, remaining)) => {
                    self.in_flight = Some((texel, remaining - 1));
                    SlotRead::NotReady
                }
                None => SlotRead::NotReady,
            }
        }
    }

    fn id(raw: u16) -> Option<PickId> {
        PickId::new(raw)
    }

    #[test]
    fn complete_while_idle_is_a_no_op() {
        let mut channel = TransferChannel::new(FakeSlot::with_latency(0), 0);
        assert_eq!(channel.try_complete(), Completion::Idle);
        assert_eq!(channel.state(), TransferState::Idle);
        assert_eq!(channel.resolved(), None);
        assert_eq!(channel.slot().begin_calls, 0);
    }

    #[test]
    fn issue_moves_idle_to_pending() {
        let mut channel = TransferChannel::new(FakeSlot::with_latency(0), 0);
        channel.issue().unwrap();
        assert_eq!(channel.state(), TransferState::Pending);
        assert_eq!(channel.slot().begin_calls, 1);
    }

    #[test]
    fn issue_while_pending_is_rejected() {
        let mut channel = TransferChannel::new(FakeSlot::with_latency(3), 0);
        channel.issue().unwrap();
        assert!(matches!(
            channel.issue(),
            Err(ManipDrawError::TransferInFlight)
        ));
        assert_eq!(channel.slot().begin_calls, 1);
    }

    #[test]
    fn completion_delivers_the_issued_texel() {
        let mut slot = FakeSlot::with_latency(0);
        slot.texel = 42;
        let mut channel = TransferChannel::new(slot, 0);
        channel.issue().unwrap();
        assert_eq!(channel.try_complete(), Completion::Resolved(id(42)));
        assert_eq!(channel.state(), TransferState::Idle);
        assert_eq!(channel.resolved(), id(42));
    }

    #[test]
    fn not_ready_keeps_previous_pick_and_stays_pending() {
        let mut slot = FakeSlot::with_latency(0);
        slot.texel = 7;
        let mut channel = TransferChannel::new(slot, 0);
        channel.issue().unwrap();
        let _ = channel.try_complete();
        assert_eq!(channel.resolved(), id(7));

        channel.slot.texel = 9;
        channel.slot.latency = 2;
        channel.issue().unwrap();
        assert_eq!(channel.try_complete(), Completion::Waiting);
        assert_eq!(channel.try_complete(), Completion::Waiting);
        assert_eq!(channel.resolved(), id(7));
        assert!(channel.is_pending());
        assert_eq!(channel.waited_polls(), 2);

        assert_eq!(channel.try_complete(), Completion::Resolved(id(9)));
        assert_eq!(channel.waited_polls(), 0);
    }

    #[test]
    fn sentinel_texel_resolves_to_none() {
        let mut slot = FakeSlot::with_latency(0);
        slot.texel = 5;
        let mut channel = TransferChannel::new(slot, 0);
        channel.issue().unwrap();
        let _ = channel.try_complete();
        assert_eq!(channel.resolved(), id(5));

        channel.slot.texel = PickId::NONE_RAW;
        channel.issue().unwrap();
        assert_eq!(channel.try_complete(), Completion::Resolved(None));
        assert_eq!(channel.resolved(), None);
    }

    #[test]
    fn failed_map_returns_to_idle_with_last_pick() {
        let mut slot = FakeSlot::with_latency(0);
        slot.texel = 3;
        let mut channel = TransferChannel::new(slot, 0);
        channel.issue().unwrap();
        let _ = channel.try_complete();

        channel.slot.fail_next = true;
        channel.issue().unwrap();
        assert_eq!(channel.try_complete(), Completion::Failed);
        assert_eq!(channel.state(), TransferState::Idle);
        assert_eq!(channel.resolved(), id(3));
        // A fresh transfer can be issued right away.
        channel.issue().unwrap();
    }

    #[test]
    fn stalled_transfer_is_never_abandoned() {
        let mut slot = FakeSlot::with_latency(0);
        slot.script = std::iter::repeat(SlotRead::NotReady).take(10).collect();
        let mut channel = TransferChannel::new(slot, 4);
        channel.issue().unwrap();
        for _ in 0..10 {
            assert_eq!(channel.try_complete(), Completion::Waiting);
        }
        assert!(channel.is_pending());
        assert_eq!(channel.waited_polls(), 10);
        assert_eq!(channel.try_complete(), Completion::Resolved(None));
    }
}
