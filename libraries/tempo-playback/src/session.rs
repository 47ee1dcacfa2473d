//! Playback session
//!
//! Owns the queue, the engine handle and the resolver, and runs the
//! `Idle → Loading → Playing ⇄ Paused` state machine.
//!
//! Two mechanisms keep concurrent UI actions sane:
//! - a single-flight `busy` flag: play/skip/seek requests that arrive while
//!   another one is in progress are dropped, not queued
//! - a generation counter: every load takes a new generation and `stop`
//!   bumps it too, so a resolution that finishes after the user moved on is
//!   discarded without touching the engine
//! - a queue epoch bumped by `set_queue`, which discards only loads that
//!   target a queue index
//!
//! Session state sits behind a `std::sync::Mutex` that is never held across
//! an await point.

use crate::engine::{EngineStatus, PlayerEngine};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::queue::Queue;
use crate::types::{PlaybackConfig, PlaybackSnapshot, PlaybackState, RepeatMode};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempo_core::{Track, TrackId, UNKNOWN_ARTIST, UNKNOWN_TITLE};
use tempo_resolver::{ResolvedSource, SourceResolver};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What happened to a play, skip or seek request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A new track was resolved and started
    Started,

    /// The requested track was already current and playback resumed
    Resumed,

    /// Another request was in flight; this one was ignored
    Dropped,

    /// The request completed after the user moved on and was discarded
    Superseded,

    /// Nothing to play (empty queue)
    Skipped,
}

#[derive(Debug, Default)]
struct SessionState {
    queue: Queue,
    current_track: Option<Track>,
    state: PlaybackState,
    repeat_mode: RepeatMode,
    is_playing: bool,
    position_ms: u64,
    duration_ms: u64,
}

/// Clears the busy flag when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single active playback session
pub struct PlaybackSession {
    engine: Arc<dyn PlayerEngine>,
    resolver: Arc<dyn SourceResolver>,
    config: PlaybackConfig,
    inner: Mutex<SessionState>,
    busy: AtomicBool,
    generation: AtomicU64,
    queue_epoch: AtomicU64,
    events: broadcast::Sender<PlaybackEvent>,
    status_task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackSession {
    /// Create an idle session with an empty queue
    pub fn new(
        engine: Arc<dyn PlayerEngine>,
        resolver: Arc<dyn SourceResolver>,
        config: PlaybackConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let inner = SessionState {
            repeat_mode: config.repeat,
            ..SessionState::default()
        };

        Self {
            engine,
            resolver,
            config,
            inner: Mutex::new(inner),
            busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            queue_epoch: AtomicU64::new(0),
            events,
            status_task: Mutex::new(None),
        }
    }

    /// Status channel sized from the session config
    pub fn status_channel(&self) -> (mpsc::Sender<EngineStatus>, mpsc::Receiver<EngineStatus>) {
        mpsc::channel(self.config.status_buffer.max(1))
    }

    /// Receive future playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let inner = self.lock();
        PlaybackSnapshot {
            current_track: inner.current_track.clone(),
            current_index: inner.queue.current_index(),
            queue_len: inner.queue.len(),
            state: inner.state,
            is_playing: inner.is_playing,
            is_busy: self.busy.load(Ordering::SeqCst),
            position_ms: inner.position_ms,
            duration_ms: inner.duration_ms,
            repeat_mode: inner.repeat_mode,
        }
    }

    /// Queued tracks
    pub fn queue(&self) -> Vec<Track> {
        self.lock().queue.tracks().to_vec()
    }

    // ===== Queue =====

    /// Replace the queue; `None` empties it
    ///
    /// The current track keeps playing but is no longer a queue item.
    /// Pending loads of queue items are discarded; direct plays continue.
    pub fn set_queue(&self, tracks: Option<Vec<Track>>) {
        self.queue_epoch.fetch_add(1, Ordering::SeqCst);
        let length = {
            let mut inner = self.lock();
            match tracks {
                Some(tracks) => inner.queue.set(tracks),
                None => inner.queue.clear(),
            }
            inner.queue.len()
        };
        debug!(length, "Queue replaced");
        self.emit(PlaybackEvent::QueueChanged { length });
    }

    /// Off → RepeatOne → Shuffle → Off
    pub fn cycle_repeat_mode(&self) -> RepeatMode {
        let mode = {
            let mut inner = self.lock();
            inner.repeat_mode = inner.repeat_mode.cycle();
            inner.repeat_mode
        };
        debug!(?mode, "Repeat mode changed");
        self.emit(PlaybackEvent::RepeatModeChanged { mode });
        mode
    }

    // ===== Play requests =====

    /// Play `id`, from the queue when it is queued, otherwise directly
    ///
    /// Hints are used for direct plays only; resolved upstream metadata
    /// replaces the title.
    pub async fn play_track_by_id(
        &self,
        id: &TrackId,
        title_hint: Option<&str>,
        poster_hint: Option<&str>,
    ) -> Result<PlayOutcome> {
        let Some(_guard) = self.try_acquire() else {
            debug!(track_id = %id, "Busy, dropping play request");
            return Ok(PlayOutcome::Dropped);
        };

        let queued = {
            let inner = self.lock();
            inner
                .queue
                .position_of(id)
                .and_then(|i| inner.queue.get(i).cloned().map(|t| (i, t)))
        };

        match queued {
            Some((index, track)) => self.load(track, Some(index)).await,
            None => {
                let title = title_hint.unwrap_or(UNKNOWN_TITLE);
                let track = match poster_hint {
                    Some(poster) => Track::with_poster(id.clone(), title, UNKNOWN_ARTIST, poster),
                    None => Track::new(id.clone(), title, UNKNOWN_ARTIST),
                };
                self.load(track, None).await
            }
        }
    }

    /// Play the queue item at `index`
    pub async fn play_at_index(&self, index: usize) -> Result<PlayOutcome> {
        let Some(_guard) = self.try_acquire() else {
            debug!(index, "Busy, dropping play request");
            return Ok(PlayOutcome::Dropped);
        };
        self.play_index_locked(index).await
    }

    /// Advance under the current repeat mode
    pub async fn next(&self) -> Result<PlayOutcome> {
        let Some(_guard) = self.try_acquire() else {
            return Ok(PlayOutcome::Dropped);
        };
        let index = {
            let inner = self.lock();
            inner.queue.next_index(inner.repeat_mode)
        };
        match index {
            Some(index) => self.play_index_locked(index).await,
            None => Ok(PlayOutcome::Skipped),
        }
    }

    /// Go back under the current repeat mode
    pub async fn previous(&self) -> Result<PlayOutcome> {
        let Some(_guard) = self.try_acquire() else {
            return Ok(PlayOutcome::Dropped);
        };
        let index = {
            let inner = self.lock();
            inner.queue.previous_index(inner.repeat_mode)
        };
        match index {
            Some(index) => self.play_index_locked(index).await,
            None => Ok(PlayOutcome::Skipped),
        }
    }

    // ===== Transport =====

    pub async fn pause(&self) -> Result<()> {
        self.require_track()?;
        self.engine.pause().await?;
        self.transition(PlaybackState::Paused, false);
        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        self.require_track()?;
        self.engine.play().await?;
        self.transition(PlaybackState::Playing, true);
        Ok(())
    }

    /// Seek within the current track; returns `false` when dropped as busy
    pub async fn seek(&self, position_ms: u64) -> Result<bool> {
        let Some(_guard) = self.try_acquire() else {
            debug!(position_ms, "Busy, dropping seek");
            return Ok(false);
        };
        self.require_track()?;
        self.engine.seek(position_ms).await?;
        self.lock().position_ms = position_ms;
        Ok(true)
    }

    /// Unload the engine and forget the current track. The queue is kept.
    pub async fn stop(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut inner = self.lock();
            inner.current_track = None;
            // index is always valid or None, clearing cannot fail
            let _ = inner.queue.set_current(None);
            inner.position_ms = 0;
            inner.duration_ms = 0;
        }
        self.transition(PlaybackState::Idle, false);
        info!("Playback stopped");
        self.engine.unload().await?;
        Ok(())
    }

    /// Stop playback and end the status loop
    pub async fn shutdown(&self) -> Result<()> {
        let handle = self
            .status_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.stop().await
    }

    // ===== Status reconciliation =====

    /// Mirror one engine status into the session
    ///
    /// Status is the only source of position. Reports that arrive while a
    /// new track is loading belong to the old media and are ignored.
    pub async fn apply_status(&self, status: EngineStatus) {
        let finished = {
            let mut inner = self.lock();
            if inner.state == PlaybackState::Loading || inner.current_track.is_none() {
                return;
            }

            inner.position_ms = status.position_ms;
            inner.duration_ms = status.duration_ms;
            inner.is_playing = status.is_playing;

            let next_state = match (inner.state, status.is_playing) {
                (PlaybackState::Paused | PlaybackState::Idle, true) => Some(PlaybackState::Playing),
                (PlaybackState::Playing, false) if !status.did_just_finish => {
                    Some(PlaybackState::Paused)
                }
                _ => None,
            };
            if let Some(state) = next_state {
                inner.state = state;
            }

            let finished = if status.did_just_finish {
                inner.current_track.as_ref().map(|t| t.id.clone())
            } else {
                None
            };
            drop(inner);

            if let Some(state) = next_state {
                self.emit(PlaybackEvent::StateChanged { state });
            }
            finished
        };

        self.emit(PlaybackEvent::PositionUpdate {
            position_ms: status.position_ms,
            duration_ms: status.duration_ms,
        });

        if let Some(track_id) = finished {
            self.emit(PlaybackEvent::TrackFinished {
                track_id: track_id.clone(),
            });
            if let Err(e) = self.handle_track_finished(&track_id).await {
                warn!(track_id = %track_id, "End-of-track advance failed: {}", e);
            }
        }
    }

    /// Consume statuses until the sender side closes
    pub async fn run_status_loop(&self, mut rx: mpsc::Receiver<EngineStatus>) {
        debug!("Status loop started");
        while let Some(status) = rx.recv().await {
            self.apply_status(status).await;
        }
        debug!("Status loop ended");
    }

    /// Run the status loop on the tokio runtime; `shutdown` stops it
    pub fn spawn_status_loop(self: &Arc<Self>, rx: mpsc::Receiver<EngineStatus>) {
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move { session.run_status_loop(rx).await });

        let previous = self
            .status_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    async fn handle_track_finished(&self, track_id: &TrackId) -> Result<PlayOutcome> {
        let Some(_guard) = self.try_acquire() else {
            return Ok(PlayOutcome::Dropped);
        };

        let (mode, current_index, next, next_is_current) = {
            let inner = self.lock();
            let next = inner.queue.next_index(inner.repeat_mode);
            let next_is_current = next
                .and_then(|i| inner.queue.get(i))
                .zip(inner.current_track.as_ref())
                .is_some_and(|(next, current)| next.same_identity(current));
            (
                inner.repeat_mode,
                inner.queue.current_index(),
                next,
                next_is_current,
            )
        };

        if mode == RepeatMode::RepeatOne {
            debug!(track_id = %track_id, "Repeating track");
            return self.restart(current_index).await;
        }

        match next {
            // the finished media is still loaded, rewind it
            Some(index) if next_is_current => {
                debug!(track_id = %track_id, index, "Next track is the finished one");
                self.restart(Some(index)).await
            }
            Some(index) => self.play_index_locked(index).await,
            None => {
                debug!(track_id = %track_id, "Queue empty at end of track");
                self.transition(PlaybackState::Idle, false);
                Ok(PlayOutcome::Skipped)
            }
        }
    }

    /// Replay the loaded media from the start. Caller holds the busy guard.
    async fn restart(&self, index: Option<usize>) -> Result<PlayOutcome> {
        self.engine.seek(0).await?;
        self.engine.play().await?;
        {
            let mut inner = self.lock();
            inner.position_ms = 0;
            if inner.queue.set_current(index).is_err() {
                let _ = inner.queue.set_current(None);
            }
        }
        self.transition(PlaybackState::Playing, true);
        Ok(PlayOutcome::Resumed)
    }

    // ===== Loading =====

    /// Caller holds the busy guard
    async fn play_index_locked(&self, index: usize) -> Result<PlayOutcome> {
        let track = {
            let inner = self.lock();
            if inner.queue.is_empty() {
                return Err(PlaybackError::QueueEmpty);
            }
            inner
                .queue
                .get(index)
                .cloned()
                .ok_or(PlaybackError::IndexOutOfBounds(index))?
        };
        self.load(track, Some(index)).await
    }

    /// Resolve and start `track`. Caller holds the busy guard.
    async fn load(&self, track: Track, index: Option<usize>) -> Result<PlayOutcome> {
        let (already_current, previous_state, previous_id) = {
            let inner = self.lock();
            let current = inner.current_track.as_ref();
            (
                current.is_some_and(|c| c.same_identity(&track)),
                inner.state,
                current.map(|c| c.id.clone()),
            )
        };

        if already_current {
            self.engine.play().await?;
            if index.is_some() {
                let _ = self.lock().queue.set_current(index);
            }
            self.transition(PlaybackState::Playing, true);
            debug!(track_id = %track.id, "Resumed current track");
            return Ok(PlayOutcome::Resumed);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let queue_epoch = index.map(|_| self.queue_epoch.load(Ordering::SeqCst));
        self.transition(PlaybackState::Loading, false);
        debug!(track_id = %track.id, ?index, generation, "Loading track");

        let resolved = match self
            .resolver
            .resolve(track.id.as_str(), self.config.default_profile)
            .await
        {
            Ok(resolved) => resolved,
            Err(source) => {
                if !self.is_current(generation, queue_epoch) {
                    return Ok(self.superseded(previous_state));
                }
                self.restore(previous_state);
                let err = PlaybackError::Unplayable {
                    track_id: track.id.clone(),
                    source,
                };
                return Err(self.surface(err));
            }
        };

        if !self.is_current(generation, queue_epoch) {
            return Ok(self.superseded(previous_state));
        }

        if let Err(e) = self.start_engine(&resolved.encoding.url).await {
            {
                let mut inner = self.lock();
                inner.current_track = None;
                let _ = inner.queue.set_current(None);
            }
            self.transition(PlaybackState::Idle, false);
            return Err(self.surface(e));
        }

        if !self.is_current(generation, queue_epoch) {
            let _ = self.engine.unload().await;
            return Ok(self.superseded(previous_state));
        }

        let track_id = track.id.clone();
        self.install(track, index, &resolved);
        info!(
            track_id = %track_id,
            ?index,
            profile = %resolved.profile,
            bitrate = resolved.encoding.bitrate,
            "Now playing"
        );
        self.emit(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id: previous_id,
            index,
        });
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Playing,
        });
        Ok(PlayOutcome::Started)
    }

    async fn start_engine(&self, url: &str) -> Result<()> {
        self.engine.unload().await?;
        self.engine.load(url).await?;
        self.engine.play().await?;
        Ok(())
    }

    fn install(&self, track: Track, index: Option<usize>, resolved: &ResolvedSource) {
        let duration_ms = resolved
            .length_seconds
            .map(|s| s * 1000)
            .or(resolved.encoding.approx_duration_ms)
            .unwrap_or(0);

        let mut inner = self.lock();
        inner.current_track = Some(track.with_metadata(
            resolved.title.as_deref(),
            resolved.author.as_deref(),
        ));
        if inner.queue.set_current(index).is_err() {
            // queue changed under us; the track plays as a direct play
            let _ = inner.queue.set_current(None);
        }
        inner.state = PlaybackState::Playing;
        inner.is_playing = true;
        inner.position_ms = 0;
        inner.duration_ms = duration_ms;
    }

    // ===== Helpers =====

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    /// Whether a load started at `generation` may still take effect
    ///
    /// `queue_epoch` is `Some` for loads of a queue item.
    fn is_current(&self, generation: u64, queue_epoch: Option<u64>) -> bool {
        let queue_unchanged = match queue_epoch {
            Some(epoch) => self.queue_epoch.load(Ordering::SeqCst) == epoch,
            None => true,
        };
        queue_unchanged && self.generation.load(Ordering::SeqCst) == generation
    }

    fn superseded(&self, previous_state: PlaybackState) -> PlayOutcome {
        self.restore(previous_state);
        debug!("Discarding superseded load");
        PlayOutcome::Superseded
    }

    /// Put `Loading` back to `previous_state`
    ///
    /// A state set while loading (e.g. a pause) is kept.
    fn restore(&self, previous_state: PlaybackState) {
        if self.lock().state == PlaybackState::Loading {
            self.transition(previous_state, previous_state == PlaybackState::Playing);
        }
    }

    fn require_track(&self) -> Result<()> {
        if self.lock().current_track.is_some() {
            Ok(())
        } else {
            Err(PlaybackError::NoTrackLoaded)
        }
    }

    fn transition(&self, state: PlaybackState, is_playing: bool) {
        let changed = {
            let mut inner = self.lock();
            let changed = inner.state != state;
            inner.state = state;
            inner.is_playing = is_playing;
            changed
        };
        if changed {
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn surface(&self, err: PlaybackError) -> PlaybackError {
        error!("Playback failed: {}", err);
        self.emit(PlaybackEvent::Error {
            message: err.to_string(),
        });
        err
    }

    fn emit(&self, event: PlaybackEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
