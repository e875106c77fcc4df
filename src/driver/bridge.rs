//! Callback-to-flag bridge behind the blocking calls.
//!
//! A blocking call installs the bridge as its transaction's callback. When the
//! bus engine reports completion (interrupt context), the bridge records the
//! status, forwards the completion to the caller's own callback if one was
//! given, and raises the `fired` flag the caller is spinning on.

use crate::driver::error::{EnqueueError, EnqueueResult};
use crate::driver::transaction::{Callback, Completion, Status};
use crate::sync::CriticalSectionCell;

#[derive(Clone, Copy)]
struct BridgeState {
    armed: bool,
    fired: bool,
    status: Status,
    forward: Option<&'static dyn Callback>,
}

impl BridgeState {
    const IDLE: Self = Self {
        armed: false,
        fired: false,
        status: Status::NONE,
        forward: None,
    };
}

/// Shared state of the (single) in-flight blocking call
pub(crate) struct BlockingBridge {
    state: CriticalSectionCell<BridgeState>,
}

impl BlockingBridge {
    pub(crate) const fn new() -> Self {
        Self {
            state: CriticalSectionCell::new(BridgeState::IDLE),
        }
    }

    /// Claim the bridge for one blocking call
    pub(crate) fn arm(&self, forward: Option<&'static dyn Callback>) -> EnqueueResult<()> {
        self.state.with(|state| {
            if state.armed {
                return Err(EnqueueError::BlockingInProgress);
            }
            *state = BridgeState {
                armed: true,
                forward,
                ..BridgeState::IDLE
            };
            Ok(())
        })
    }

    /// The bridged transaction has completed
    #[inline]
    pub(crate) fn fired(&self) -> bool {
        self.state.with_ref(|state| state.fired)
    }

    /// Release the bridge, returning the captured status
    pub(crate) fn disarm(&self) -> Status {
        self.state.with(|state| {
            let status = state.status;
            *state = BridgeState::IDLE;
            status
        })
    }
}

impl Callback for BlockingBridge {
    fn on_complete(&self, completion: Completion<'_>) {
        let forward = self.state.with(|state| {
            state.status = completion.status();
            state.forward.take()
        });

        if let Some(forward) = forward {
            forward.on_complete(completion);
        }

        self.state.with(|state| state.fired = true);
    }
}
