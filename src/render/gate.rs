use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

/// One-slot gate between the CPU building a frame and the GPU consuming it.
///
/// The channel holds at most one token. Taking it starts a frame; the
/// [`FrameCompletion`] handed to the surface puts it back once the frame is
/// done, so at most one frame is ever in flight.
#[derive(Debug)]
pub struct FrameGate {
    tx: SyncSender<()>,
    rx: Receiver<()>,
}

impl FrameGate {
    pub fn new() -> Self {
        let (tx, rx) = sync_channel(1);
        // Fresh channel with room for one token, so this cannot fail.
        let _ = tx.try_send(());
        Self { tx, rx }
    }

    /// Block until no frame is in flight, then claim the slot.
    pub fn acquire(&self) -> FrameCompletion {
        // The gate keeps a sender alive, so `recv` only returns once a
        // token is available.
        let _ = self.rx.recv();
        FrameCompletion {
            tx: Some(self.tx.clone()),
        }
    }

    /// Claim the slot if it is free.
    pub fn try_acquire(&self) -> Option<FrameCompletion> {
        self.rx.try_recv().ok().map(|()| FrameCompletion {
            tx: Some(self.tx.clone()),
        })
    }

    /// Block until the in-flight frame, if any, has completed.
    pub fn wait_idle(&self) {
        drop(self.acquire());
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the frame gate when signalled or dropped.
///
/// Surfaces move this into whatever finishes the frame. A surface that
/// fails or drops the frame still releases the slot.
#[derive(Debug)]
pub struct FrameCompletion {
    tx: Option<SyncSender<()>>,
}

impl FrameCompletion {
    /// Mark the frame as complete.
    pub fn signal(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(tx) = self.tx.take() {
            match tx.try_send(()) {
                Ok(()) | Err(TrySendError::Disconnected(())) => {}
                Err(TrySendError::Full(())) => {
                    tracing::warn!("frame gate released twice");
                }
            }
        }
    }
}

impl Drop for FrameCompletion {
    fn drop(&mut self) {
        self.release();
    }
}
