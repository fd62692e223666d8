use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::session::TimerToken;

const TICK: Duration = Duration::from_secs(1);

/// Once-per-second countdown feeding `TimerToken`s into a channel.
///
/// Each run sends exactly `secs` ticks and then stops. Starting a new run or
/// cancelling aborts the previous task; the session still filters stale
/// tokens in case a tick was already queued.
pub struct Countdown {
    tx: mpsc::UnboundedSender<TimerToken>,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// A countdown and the receiving end for its ticks.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, handle: None }, rx)
    }

    /// Start a run of `secs` ticks for `token`, cancelling any previous run.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self, token: TimerToken, secs: u32) {
        self.cancel();
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for _ in 0..secs {
                ticker.tick().await;
                if tx.send(token).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
