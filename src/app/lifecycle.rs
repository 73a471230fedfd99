use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use crate::{
    display::{layout::compose_offline, Canvas, FontSet, IconSet, Panel},
    Result,
};

/// Signal number reported for [`ShutdownSignal::trigger`].
pub const MANUAL_SHUTDOWN: i32 = 0;

struct SignalGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Shutdown requests observed at the loop's idle point.
pub struct ShutdownSignal {
    tx: Sender<i32>,
    rx: Receiver<i32>,
    _guard: Option<SignalGuard>,
}

impl ShutdownSignal {
    /// Listen for SIGINT and SIGTERM on a helper thread. Other signals keep
    /// their default disposition.
    pub fn install() -> Result<Self> {
        let mut shutdown = Self::manual();
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();
        let tx = shutdown.tx.clone();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                let _ = tx.try_send(signal);
            }
        });
        shutdown._guard = Some(SignalGuard {
            handle,
            thread: Some(thread),
        });
        Ok(shutdown)
    }

    /// A signal that only fires through [`trigger`](Self::trigger).
    pub fn manual() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            tx,
            rx,
            _guard: None,
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.try_send(MANUAL_SHUTDOWN);
    }

    /// Sleep up to `timeout`. Returns the signal number if shutdown was requested.
    pub fn wait(&self, timeout: Duration) -> Option<i32> {
        match self.rx.recv_timeout(timeout) {
            Ok(signal) => Some(signal),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking check.
    pub fn requested(&self) -> Option<i32> {
        self.rx.try_recv().ok()
    }
}

/// Draw the offline screen once before exiting.
pub(super) fn render_offline<P: Panel + ?Sized>(
    panel: &mut P,
    fonts: &FontSet,
    icons: &IconSet,
    canvas: &mut Canvas,
    hostname: &str,
) -> Result<()> {
    canvas.clear();
    let frame = compose_offline(icons, hostname);
    fonts.draw_frame(&frame, canvas);
    panel.commit(canvas)
}
