//! Playback position sampling

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{stream, Stream};
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::engine::EngineSession;

/// Shared view of the prepared session, read by position streams
#[derive(Clone, Default)]
pub(crate) struct PositionProbe(Arc<Mutex<Option<Arc<dyn EngineSession>>>>);

impl PositionProbe {
    pub fn attach(&self, session: Arc<dyn EngineSession>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn detach(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Position of the prepared session, 0 when there is none
    pub fn sample(&self) -> u64 {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |session| session.position_ms())
    }
}

/// Endless stream of positions sampled every `period`
///
/// The first value is emitted immediately. Sampling stops when the stream is
/// dropped.
pub(crate) fn sample_positions(
    probe: PositionProbe,
    period: Duration,
) -> impl Stream<Item = u64> + Send + 'static {
    stream::unfold(
        (probe, None::<Interval>),
        move |(probe, ticker)| async move {
            let mut ticker = ticker.unwrap_or_else(|| {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker
            });
            ticker.tick().await;
            Some((probe.sample(), (probe, Some(ticker))))
        },
    )
}
