//! Async editing session.
//!
//! ```text
//!  EditorHandle ──┐
//!  tick task ─────┼──▶ mpsc ──▶ actor (owns Editor) ──▶ oneshot replies
//!  export task ───┘                  │
//!                                    └──▶ broadcast SessionEvent
//! ```
//!
//! The actor is the only owner of the [`Editor`]; every mutation arrives as
//! a command on one channel and is applied in order. While playing, a tick
//! task posts `Tick` commands at the configured tick rate. Each playback run
//! has a generation number, so a tick already queued when playback stopped
//! is recognised and dropped.

use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use flipbook_common::clock::{SessionClock, TimestampNs};
use flipbook_common::config::PlaybackSettings;
use flipbook_frame_model::snapshot::Snapshot;
use flipbook_render_engine::compositor::OverlayLayer;
use flipbook_render_engine::export::{
    export_frames, ExportArtifact, ExportError, FrameEncoder, ProgressCallback,
};

use crate::action::Action;
use crate::editor::{Editor, EditorView};
use crate::error::{EditorError, EditorResult};

const COMMAND_BUFFER: usize = 256;
const EVENT_BUFFER: usize = 64;

/// Notifications published by a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PlaybackStarted { at_ns: TimestampNs },
    PlaybackStopped,
    /// Playback moved the active frame.
    FrameAdvanced { frame: usize, at_ns: TimestampNs },
    ExportCompleted { frame_count: usize, bytes: usize },
    ExportFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackRequest {
    Play,
    Pause,
    Toggle,
}

enum Command {
    Dispatch {
        action: Action,
        reply: oneshot::Sender<EditorResult<()>>,
    },
    Playback {
        request: PlaybackRequest,
        reply: oneshot::Sender<bool>,
    },
    Tick {
        generation: u64,
        now_ns: TimestampNs,
    },
    View {
        reply: oneshot::Sender<EditorView>,
    },
    Overlays {
        reply: oneshot::Sender<Vec<OverlayLayer>>,
    },
    Export {
        encoder: Box<dyn FrameEncoder>,
        progress: Option<ProgressCallback>,
        reply: oneshot::Sender<EditorResult<ExportArtifact>>,
    },
    ExportFinished {
        result: Result<ExportArtifact, ExportError>,
        reply: oneshot::Sender<EditorResult<ExportArtifact>>,
    },
    Shutdown,
}

/// A running session: the actor task plus a handle to talk to it.
pub struct EditorSession {
    handle: EditorHandle,
    task: JoinHandle<()>,
}

impl EditorSession {
    /// Move `editor` into a new actor task on the current runtime.
    pub fn spawn(editor: Editor, settings: &PlaybackSettings) -> Self {
        let (actor, handle) = SessionActor::new(editor, settings.tick_rate_hz);
        let task = tokio::spawn(actor.run());
        Self { handle, task }
    }

    pub fn handle(&self) -> EditorHandle {
        self.handle.clone()
    }

    /// Stop the actor and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.handle.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Editor session task failed");
        }
    }
}

/// Cloneable client for a running session.
#[derive(Clone)]
pub struct EditorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<SessionEvent>,
}

impl EditorHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> EditorResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| EditorError::SessionClosed)?;
        rx.await.map_err(|_| EditorError::SessionClosed)
    }

    /// Apply an action inside the session.
    pub async fn dispatch(&self, action: Action) -> EditorResult<()> {
        self.request(|reply| Command::Dispatch { action, reply }).await?
    }

    pub async fn set_frame_data(&self, index: usize, snapshot: Snapshot) -> EditorResult<()> {
        self.dispatch(Action::SetFrameData { index, snapshot }).await
    }

    pub async fn set_frames(&self, snapshots: Vec<Snapshot>) -> EditorResult<()> {
        self.dispatch(Action::SetFrames(snapshots)).await
    }

    pub async fn set_active_frame(&self, index: usize) -> EditorResult<()> {
        self.dispatch(Action::SetActiveFrame(index)).await
    }

    pub async fn next_frame(&self) -> EditorResult<()> {
        self.dispatch(Action::NextFrame).await
    }

    pub async fn prev_frame(&self) -> EditorResult<()> {
        self.dispatch(Action::PrevFrame).await
    }

    pub async fn set_pending_frame_count(&self, count: usize) -> EditorResult<()> {
        self.dispatch(Action::SetPendingFrameCount(count)).await
    }

    pub async fn apply_frame_count(&self) -> EditorResult<()> {
        self.dispatch(Action::ApplyFrameCount).await
    }

    pub async fn set_fps(&self, fps: u32) -> EditorResult<()> {
        self.dispatch(Action::SetFps(fps)).await
    }

    pub async fn save_drawing_state(&self, snapshot: Snapshot) -> EditorResult<()> {
        self.dispatch(Action::SaveDrawingState(snapshot)).await
    }

    pub async fn undo(&self) -> EditorResult<()> {
        self.dispatch(Action::Undo).await
    }

    pub async fn toggle_keyframe(&self, index: usize) -> EditorResult<()> {
        self.dispatch(Action::ToggleKeyframe(index)).await
    }

    /// Start playback. Returns whether the session is now playing.
    pub async fn play(&self) -> EditorResult<bool> {
        self.playback(PlaybackRequest::Play).await
    }

    pub async fn pause(&self) -> EditorResult<bool> {
        self.playback(PlaybackRequest::Pause).await
    }

    pub async fn toggle_playback(&self) -> EditorResult<bool> {
        self.playback(PlaybackRequest::Toggle).await
    }

    async fn playback(&self, request: PlaybackRequest) -> EditorResult<bool> {
        self.request(|reply| Command::Playback { request, reply }).await
    }

    pub async fn view(&self) -> EditorResult<EditorView> {
        self.request(|reply| Command::View { reply }).await
    }

    pub async fn overlays(&self) -> EditorResult<Vec<OverlayLayer>> {
        self.request(|reply| Command::Overlays { reply }).await
    }

    /// Export the current frames. The frame list is copied when the session
    /// receives the request; the session keeps serving commands while the
    /// export renders.
    pub async fn export(&self, encoder: Box<dyn FrameEncoder>) -> EditorResult<ExportArtifact> {
        self.export_with_progress(encoder, None).await
    }

    pub async fn export_with_progress(
        &self,
        encoder: Box<dyn FrameEncoder>,
        progress: Option<ProgressCallback>,
    ) -> EditorResult<ExportArtifact> {
        self.request(|reply| Command::Export {
            encoder,
            progress,
            reply,
        })
        .await?
    }

    /// Receive session events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

struct SessionActor {
    editor: Editor,
    clock: SessionClock,
    tick_period: Duration,
    commands: mpsc::WeakSender<Command>,
    inbox: mpsc::Receiver<Command>,
    events: broadcast::Sender<SessionEvent>,
    ticker: Option<JoinHandle<()>>,
    generation: u64,
}

impl SessionActor {
    fn new(editor: Editor, tick_rate_hz: u32) -> (Self, EditorHandle) {
        let (tx, inbox) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let actor = Self {
            editor,
            clock: SessionClock::from_epoch(Instant::now().into_std()),
            tick_period: Duration::from_secs_f64(1.0 / tick_rate_hz.max(1) as f64),
            commands: tx.downgrade(),
            inbox,
            events: events.clone(),
            ticker: None,
            generation: 0,
        };
        let handle = EditorHandle {
            commands: tx,
            events,
        };
        (actor, handle)
    }

    async fn run(mut self) {
        tracing::debug!(
            epoch = self.clock.epoch_wall(),
            tick_period_us = self.tick_period.as_micros() as u64,
            "Editor session started"
        );
        while let Some(command) = self.inbox.recv().await {
            if !self.handle_command(command) {
                break;
            }
        }
        self.stop_ticker();
        tracing::debug!("Editor session closed");
    }

    fn now_ns(&self) -> TimestampNs {
        self.clock.ns_at(Instant::now().into_std())
    }

    /// Timestamps inside dispatched actions come from the caller's clock;
    /// replace them with the session clock that also stamps ticks.
    fn restamp(&self, action: Action) -> Action {
        match action {
            Action::SetPlaying { playing, .. } => Action::SetPlaying {
                playing,
                now_ns: self.now_ns(),
            },
            Action::Tick { .. } => Action::Tick {
                now_ns: self.now_ns(),
            },
            other => other,
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Returns false when the session should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Dispatch { action, reply } => {
                let result = self.editor.dispatch(self.restamp(action));
                if let Err(e) = &result {
                    tracing::debug!(error = %e, "Action rejected");
                }
                let _ = reply.send(result);
            }
            Command::Playback { request, reply } => {
                let now_ns = self.now_ns();
                match request {
                    PlaybackRequest::Play => self.editor.set_playing(true, now_ns),
                    PlaybackRequest::Pause => self.editor.set_playing(false, now_ns),
                    PlaybackRequest::Toggle => self.editor.toggle_playback(now_ns),
                }
                let _ = reply.send(self.editor.is_playing());
            }
            Command::Tick { generation, now_ns } => {
                if generation != self.generation {
                    tracing::trace!(generation, current = self.generation, "Stale tick dropped");
                } else if self.editor.tick(now_ns) {
                    self.publish(SessionEvent::FrameAdvanced {
                        frame: self.editor.active_frame(),
                        at_ns: now_ns,
                    });
                }
            }
            Command::View { reply } => {
                let _ = reply.send(self.editor.view());
            }
            Command::Overlays { reply } => {
                let _ = reply.send(self.editor.overlays());
            }
            Command::Export {
                encoder,
                progress,
                reply,
            } => self.start_export(encoder, progress, reply),
            Command::ExportFinished { result, reply } => {
                match &result {
                    Ok(artifact) => self.publish(SessionEvent::ExportCompleted {
                        frame_count: artifact.frame_count,
                        bytes: artifact.bytes.len(),
                    }),
                    Err(e) => self.publish(SessionEvent::ExportFailed {
                        message: e.to_string(),
                    }),
                }
                let _ = reply.send(result.map_err(EditorError::from));
            }
            Command::Shutdown => return false,
        }

        self.sync_ticker();
        true
    }

    fn start_export(
        &mut self,
        encoder: Box<dyn FrameEncoder>,
        progress: Option<ProgressCallback>,
        reply: oneshot::Sender<EditorResult<ExportArtifact>>,
    ) {
        let (request, ticket) = match self.editor.begin_export() {
            Ok(started) => started,
            Err(e) => {
                tracing::debug!(error = %e, "Export refused");
                let _ = reply.send(Err(e));
                return;
            }
        };

        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = export_frames(request, encoder, ticket, progress).await;
            let Some(tx) = commands.upgrade() else {
                let _ = reply.send(result.map_err(EditorError::from));
                return;
            };
            if tx
                .send(Command::ExportFinished { result, reply })
                .await
                .is_err()
            {
                tracing::debug!("Session closed before export finished");
            }
        });
    }

    /// Start or stop the tick task to match the editor's playback state.
    fn sync_ticker(&mut self) {
        match (self.editor.is_playing(), self.ticker.is_some()) {
            (true, false) => {
                self.generation += 1;
                let at_ns = self.editor.playback().last_advance_ns().unwrap_or(0);
                self.ticker = Some(spawn_ticker(
                    self.commands.clone(),
                    self.generation,
                    self.tick_period,
                    self.clock.clone(),
                ));
                tracing::debug!(generation = self.generation, "Tick task started");
                self.publish(SessionEvent::PlaybackStarted { at_ns });
            }
            (false, true) => {
                self.stop_ticker();
                self.publish(SessionEvent::PlaybackStopped);
            }
            _ => {}
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(task) = self.ticker.take() {
            task.abort();
            self.generation += 1;
            tracing::debug!(generation = self.generation, "Tick task stopped");
        }
    }
}

fn spawn_ticker(
    commands: mpsc::WeakSender<Command>,
    generation: u64,
    period: Duration,
    clock: SessionClock,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            let at = interval.tick().await;
            let Some(tx) = commands.upgrade() else {
                break;
            };
            let tick = Command::Tick {
                generation,
                now_ns: clock.ns_at(at.into_std()),
            };
            match tx.try_send(tick) {
                // A full inbox drops this tick; the next one catches up.
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Closed(_)) => break,
            }
        }
    })
}
