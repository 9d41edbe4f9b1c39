//! Playback transport: Stopped / Playing, driven by a cancellable tick thread.
//!
//! `play` moves the note sink into a tick thread that wakes every
//! `tick_interval`, runs the [`StepClock`] against the audio clock and pushes
//! the due steps' notes into the sink. `stop` cancels the thread, takes the
//! sink back and silences it. The thread never blocks on the view: step
//! notifications use `try_send` and are dropped when nobody keeps up.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, error, info, trace, warn};

use crate::engine::scheduler::{ClockConfig, StepClock};
use crate::error::TransportError;
use crate::profile::BitMode;
use crate::sequencing::composition::{self, NoteEvent, SharedComposition};
use crate::session::Notification;
use crate::STEP_COUNT;

/// The device clock the scheduler plans against, in seconds.
pub trait AudioClock: Send + Sync + 'static {
    fn now(&self) -> f64;

    /// Make sure the device is running before the first notes are planned.
    fn resume(&self) {}
}

/// Where scheduled notes go: the live chain's command queue, or a test double.
pub trait NoteSink: Send + 'static {
    fn schedule(&mut self, event: NoteEvent);
    fn set_bit_mode(&mut self, mode: BitMode);
    fn silence(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportConfig {
    /// Wall-clock period of the tick thread, independent of tempo.
    pub tick_interval: Duration,
    /// Seconds ahead of the audio clock that steps are scheduled.
    pub lookahead: f64,
    /// Delay between `play` and the first step so it is never late.
    pub start_margin: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(25),
            lookahead: 0.1,
            start_margin: 0.05,
        }
    }
}

struct Running<S> {
    cancel: Sender<()>,
    handle: JoinHandle<S>,
}

pub struct Transport<C: AudioClock, S: NoteSink> {
    clock: Arc<C>,
    sink: Option<S>,
    composition: SharedComposition,
    notifications: Sender<Notification>,
    config: TransportConfig,
    playhead: Arc<AtomicUsize>,
    running: Option<Running<S>>,
}

impl<C: AudioClock, S: NoteSink> Transport<C, S> {
    pub fn new(
        clock: Arc<C>,
        sink: S,
        composition: SharedComposition,
        notifications: Sender<Notification>,
        config: TransportConfig,
    ) -> Self {
        Self {
            clock,
            sink: Some(sink),
            composition,
            notifications,
            config,
            playhead: Arc::new(AtomicUsize::new(0)),
            running: None,
        }
    }

    /// Step the next `play` starts from (and, while playing, the next step to be scheduled).
    pub fn playhead(&self) -> usize {
        self.playhead.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    pub fn play(&mut self) -> Result<(), TransportError> {
        if self.is_playing() {
            return Ok(());
        }
        // A non-looping run may have ended on its own; take the sink back.
        self.reap();

        let (step_duration, mode) = {
            let composition = composition::read(&self.composition);
            (composition.step_duration()?, composition.bit_mode)
        };
        let mut sink = self.sink.take().ok_or(TransportError::OutputLost)?;
        sink.set_bit_mode(mode);

        self.clock.resume();
        let start = self.playhead();
        let step_clock = StepClock::new(start, self.clock.now() + self.config.start_margin);
        let (cancel, cancelled) = crossbeam_channel::bounded(1);

        let worker = TickWorker {
            clock: Arc::clone(&self.clock),
            sink,
            composition: Arc::clone(&self.composition),
            notifications: self.notifications.clone(),
            playhead: Arc::clone(&self.playhead),
            config: self.config,
            mode,
        };
        let handle = thread::spawn(move || worker.run(step_clock, cancelled));

        info!(step = start, step_duration, "playback started");
        self.running = Some(Running { cancel, handle });
        Ok(())
    }

    /// Cancel the tick thread, silence the sink and rewind to step 0.
    /// Safe to call when already stopped.
    pub fn stop(&mut self) {
        let was_running = self.running.is_some();
        self.reap();
        if let Some(sink) = self.sink.as_mut() {
            sink.silence();
        }
        self.playhead.store(0, Ordering::Relaxed);
        if was_running {
            info!("playback stopped");
        }
    }

    /// Forward a bit-mode change while stopped; the tick thread does it while playing.
    pub fn set_bit_mode(&mut self, mode: BitMode) {
        if let Some(sink) = self.sink.as_mut() {
            sink.set_bit_mode(mode);
        }
    }

    fn reap(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        drop(running.cancel);
        match running.handle.join() {
            Ok(sink) => self.sink = Some(sink),
            Err(_) => error!("tick thread panicked; note output lost"),
        }
    }
}

impl<C: AudioClock, S: NoteSink> Drop for Transport<C, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

struct TickWorker<C, S> {
    clock: Arc<C>,
    sink: S,
    composition: SharedComposition,
    notifications: Sender<Notification>,
    playhead: Arc<AtomicUsize>,
    config: TransportConfig,
    mode: BitMode,
}

impl<C: AudioClock, S: NoteSink> TickWorker<C, S> {
    fn run(mut self, mut step_clock: StepClock, cancelled: Receiver<()>) -> S {
        loop {
            match self.tick(step_clock) {
                Some(next) => step_clock = next,
                None => {
                    self.playhead.store(0, Ordering::Relaxed);
                    self.notify(Notification::PlaybackFinished);
                    info!("loop finished with looping disabled");
                    break;
                }
            }

            match cancelled.recv_timeout(self.config.tick_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("tick thread exiting");
        self.sink
    }

    /// One wake-up. Returns the advanced clock, or `None` when playback ended.
    fn tick(&mut self, step_clock: StepClock) -> Option<StepClock> {
        let composition = composition::read(&self.composition);

        if composition.bit_mode != self.mode {
            self.mode = composition.bit_mode;
            self.sink.set_bit_mode(self.mode);
        }

        // Tempo edits are validated before they land; a bad value here would
        // be a bug elsewhere, so hold position rather than spin.
        let step_duration = match composition.step_duration() {
            Ok(duration) => duration,
            Err(err) => {
                warn!(%err, "skipping tick");
                return Some(step_clock);
            }
        };
        let config = ClockConfig {
            lookahead: self.config.lookahead,
            step_duration,
            looping: composition.looping,
        };

        let tick = step_clock.tick(self.clock.now(), &config);
        for due in &tick.due {
            for event in composition.step_events(due.step, due.time, step_duration) {
                self.sink.schedule(event);
            }
            self.playhead
                .store((due.step + 1) % STEP_COUNT, Ordering::Relaxed);
            trace!(step = due.step, time = due.time, "step scheduled");
            self.notify(Notification::StepAdvanced {
                step: due.step,
                time: due.time,
            });
        }

        (!tick.finished).then_some(tick.clock)
    }

    fn notify(&self, notification: Notification) {
        match self.notifications.try_send(notification) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => trace!("notification dropped, view is behind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex;
    use std::time::Instant;

    use crate::sequencing::composition::{shared, Composition, Voice};

    #[derive(Default)]
    struct ManualClock {
        bits: AtomicU64,
    }

    impl ManualClock {
        fn set(&self, seconds: f64) {
            self.bits.store(seconds.to_bits(), Ordering::SeqCst);
        }
    }

    impl AudioClock for ManualClock {
        fn now(&self) -> f64 {
            f64::from_bits(self.bits.load(Ordering::SeqCst))
        }
    }

    #[derive(Default, Clone)]
    struct Recorder {
        notes: Arc<Mutex<Vec<NoteEvent>>>,
        modes: Arc<Mutex<Vec<BitMode>>>,
        silenced: Arc<AtomicUsize>,
    }

    impl NoteSink for Recorder {
        fn schedule(&mut self, event: NoteEvent) {
            self.notes.lock().unwrap().push(event);
        }

        fn set_bit_mode(&mut self, mode: BitMode) {
            self.modes.lock().unwrap().push(mode);
        }

        fn silence(&mut self) {
            self.silenced.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fast_config() -> TransportConfig {
        TransportConfig {
            tick_interval: Duration::from_millis(1),
            ..TransportConfig::default()
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    fn transport_with_lead_notes(
        looping: bool,
    ) -> (
        Transport<ManualClock, Recorder>,
        Arc<ManualClock>,
        Recorder,
        SharedComposition,
        Receiver<Notification>,
    ) {
        let mut comp = Composition::default();
        comp.looping = looping;
        for step in 0..crate::STEP_COUNT {
            comp.pattern.set_cell(Voice::Lead, 60 + (step % 12) as u8, step, true).unwrap();
        }
        let comp = shared(comp);
        let clock = Arc::new(ManualClock::default());
        let recorder = Recorder::default();
        let (tx, rx) = crossbeam_channel::bounded(1024);
        let transport = Transport::new(
            Arc::clone(&clock),
            recorder.clone(),
            Arc::clone(&comp),
            tx,
            fast_config(),
        );
        (transport, clock, recorder, comp, rx)
    }

    #[test]
    fn play_schedules_first_step_after_margin() {
        let (mut transport, _clock, recorder, _comp, rx) = transport_with_lead_notes(true);
        transport.play().unwrap();
        assert!(transport.is_playing());

        assert!(wait_for(|| !recorder.notes.lock().unwrap().is_empty()));
        let first = recorder.notes.lock().unwrap()[0];
        assert_eq!(first.pitch, 60);
        assert!((first.time - 0.05).abs() < 1e-9);
        assert!((first.duration - 0.125).abs() < 1e-12);

        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Notification::StepAdvanced { step, .. }) => assert_eq!(step, 0),
            other => panic!("unexpected notification {other:?}"),
        }

        transport.stop();
        assert!(!transport.is_playing());
        assert_eq!(transport.playhead(), 0);
        assert_eq!(recorder.silenced.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clock_advance_schedules_steps_in_order() {
        let (mut transport, clock, recorder, _comp, _rx) = transport_with_lead_notes(true);
        transport.play().unwrap();
        clock.set(1.0);
        // Steps at 0.05 + k * 0.125 below 1.1 are k = 0..=8.
        assert!(wait_for(|| recorder.notes.lock().unwrap().len() >= 9));
        transport.stop();

        let times: Vec<f64> = recorder.notes.lock().unwrap().iter().map(|n| n.time).collect();
        assert_eq!(times.len(), 9);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn invalid_tempo_refuses_to_play() {
        let (mut transport, _clock, _recorder, comp, _rx) = transport_with_lead_notes(true);
        composition::write(&comp).bpm = 0.0;
        assert!(matches!(
            transport.play(),
            Err(TransportError::InvalidTempo(_))
        ));
        assert!(!transport.is_playing());
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut transport, ..) = transport_with_lead_notes(true);
        transport.stop();
        transport.stop();
        transport.play().unwrap();
        transport.stop();
        transport.stop();
        assert!(!transport.is_playing());
    }

    #[test]
    fn bit_mode_changes_reach_the_sink_while_playing() {
        let (mut transport, _clock, recorder, comp, _rx) = transport_with_lead_notes(true);
        transport.play().unwrap();
        composition::write(&comp).bit_mode = BitMode::Bit8;
        assert!(wait_for(|| recorder
            .modes
            .lock()
            .unwrap()
            .contains(&BitMode::Bit8)));
        transport.stop();
    }

    #[test]
    fn non_looping_playback_ends_after_one_pass() {
        let (mut transport, clock, recorder, _comp, rx) = transport_with_lead_notes(false);
        transport.play().unwrap();
        clock.set(100.0);
        assert!(wait_for(|| !transport.is_playing()));
        assert_eq!(recorder.notes.lock().unwrap().len(), crate::STEP_COUNT);
        assert!(rx.try_iter().any(|n| matches!(n, Notification::PlaybackFinished)));

        // The sink comes back and playback can restart from the top.
        transport.play().unwrap();
        transport.stop();
    }
}
