//! Interactive fill-in coordination
//!
//! Every expansion with fill-ins gets one [`Session`]: a queue of pending
//! fill-ins and deferred surfaces, the fill-in environment, and the hook lists.
//! The session is shared by handle. Each [`Surface`] it opens keeps a handle
//! too, so advancing or deferring from any surface, however late it was
//! opened, works on the same queue.
//!
//! Only two transitions exist:
//!
//! - `advance`: present the head of the queue, or run the finalize hooks
//!   once the queue is empty.
//! - `defer`: move the current surface to the tail, then `advance`.
//!
//! A surface that is dropped without either call simply never completes.

pub mod engine;

pub use engine::{FillInEngine, PlaceholderEngine};

use crate::error::{Error, Result};
use crate::script::hooks::{self, HookContext, Hooks, Phase};
use crate::script::Environment;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A file waiting to be filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFillIn {
    /// Absolute path of the template file
    pub source: PathBuf,
    /// Absolute path the result is written to
    pub destination: PathBuf,
}

/// Identifies a surface within its session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Presenting(SurfaceId),
    Finished,
}

/// Result of a transition
#[derive(Debug, Clone)]
pub enum Step {
    Presenting(Surface),
    Finished,
}

// Deferred surfaces are queued without their session handle, so the queue
// never keeps its own session alive.
enum QueueItem {
    Pending(PendingFillIn),
    Deferred(Arc<SurfaceData>),
}

struct Shared {
    queue: VecDeque<QueueItem>,
    state: State,
    hooks: Hooks,
    environment: Environment,
    source_root: PathBuf,
    destination_root: PathBuf,
    next_id: u64,
}

/// Handle to the shared state of one expansion's fill-ins
#[derive(Clone)]
pub struct Session {
    shared: Arc<Mutex<Shared>>,
    engine: Arc<dyn FillInEngine>,
}

impl Session {
    pub fn new(
        fill_ins: Vec<PendingFillIn>,
        environment: Environment,
        hooks: Hooks,
        source_root: &Path,
        destination_root: &Path,
        engine: Arc<dyn FillInEngine>,
    ) -> Self {
        let shared = Shared {
            queue: fill_ins.into_iter().map(QueueItem::Pending).collect(),
            state: State::Idle,
            hooks,
            environment,
            source_root: source_root.to_path_buf(),
            destination_root: destination_root.to_path_buf(),
            next_id: 0,
        };
        Self {
            shared: Arc::new(Mutex::new(shared)),
            engine,
        }
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    /// Items still queued, deferred surfaces included
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state() == State::Finished
    }

    /// Destinations of the queued items, head first
    pub fn queued_destinations(&self) -> Vec<PathBuf> {
        self.lock()
            .queue
            .iter()
            .map(|item| match item {
                QueueItem::Pending(p) => p.destination.clone(),
                QueueItem::Deferred(data) => data.destination.clone(),
            })
            .collect()
    }

    /// Present the next queued item, or finish the session when none is left.
    ///
    /// Finalize hooks run on the first advance that finds the queue empty and
    /// never again; later advances just report [`Step::Finished`].
    pub fn advance(&self) -> Result<Step> {
        let mut shared = self.lock();

        match shared.queue.pop_front() {
            None => {
                if shared.state == State::Finished {
                    return Ok(Step::Finished);
                }
                shared.state = State::Finished;
                let finalize = shared.hooks.take(Phase::Finalize);
                let environment = shared.environment.clone();
                let source_root = shared.source_root.clone();
                let destination_root = shared.destination_root.clone();
                drop(shared);

                tracing::info!(destination = %destination_root.display(), "all fill-ins done");
                let ctx = HookContext {
                    source_root: &source_root,
                    destination_root: &destination_root,
                    environment: &environment,
                };
                hooks::run_all(Phase::Finalize, &finalize, &ctx)?;
                Ok(Step::Finished)
            }
            Some(QueueItem::Deferred(data)) => {
                shared.state = State::Presenting(data.id);
                drop(shared);

                let surface = Surface {
                    data,
                    session: self.clone(),
                };
                tracing::debug!(surface = %surface.id(), "resuming deferred fill-in");
                self.present(&surface, |engine| engine.resume(&surface))?;
                Ok(Step::Presenting(surface))
            }
            Some(QueueItem::Pending(pending)) => {
                let id = SurfaceId(shared.next_id);
                shared.next_id += 1;
                shared.state = State::Presenting(id);
                let surface = Surface {
                    data: Arc::new(SurfaceData {
                        id,
                        source: pending.source,
                        destination: pending.destination,
                        environment: shared.environment.clone(),
                        hooks: shared.hooks.clone(),
                    }),
                    session: self.clone(),
                };
                drop(shared);

                tracing::debug!(
                    surface = %id,
                    destination = %surface.destination().display(),
                    "presenting fill-in"
                );
                let body = std::fs::read_to_string(surface.source())
                    .map_err(|e| Error::io(surface.source(), e))
                    .inspect_err(|_| self.reset_to_idle(id))?;
                self.present(&surface, |engine| engine.render(&surface, &body))?;
                Ok(Step::Presenting(surface))
            }
        }
    }

    fn defer(&self, surface: &Surface) -> Result<Step> {
        {
            let mut shared = self.lock();
            // Only the surface on screen may move itself to the tail.
            if shared.state != State::Presenting(surface.id()) {
                return Err(Error::NothingToDefer);
            }
            let queued = shared.queue.iter().any(|item| {
                matches!(item, QueueItem::Deferred(data) if Arc::ptr_eq(data, &surface.data))
            });
            if !queued {
                tracing::debug!(surface = %surface.id(), "deferring fill-in");
                shared.queue.push_back(QueueItem::Deferred(surface.data.clone()));
            }
        }
        self.advance()
    }

    // Engine calls happen without the lock held, so an engine may drive the
    // session re-entrantly.
    fn present(
        &self,
        surface: &Surface,
        call: impl FnOnce(&dyn FillInEngine) -> anyhow::Result<()>,
    ) -> Result<()> {
        call(self.engine.as_ref()).map_err(|cause| {
            self.reset_to_idle(surface.id());
            Error::FillIn {
                destination: surface.destination().to_path_buf(),
                cause,
            }
        })
    }

    fn reset_to_idle(&self, id: SurfaceId) {
        let mut shared = self.lock();
        if shared.state == State::Presenting(id) {
            shared.state = State::Idle;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Engines and hooks never run while the lock is held.
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether two handles refer to the same session
    pub fn same_session(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("Session")
            .field("state", &shared.state)
            .field("pending", &shared.queue.len())
            .finish()
    }
}

struct SurfaceData {
    id: SurfaceId,
    source: PathBuf,
    destination: PathBuf,
    environment: Environment,
    hooks: Hooks,
}

/// An editing context presenting one fill-in
#[derive(Clone)]
pub struct Surface {
    data: Arc<SurfaceData>,
    session: Session,
}

impl Surface {
    pub fn id(&self) -> SurfaceId {
        self.data.id
    }

    pub fn source(&self) -> &Path {
        &self.data.source
    }

    pub fn destination(&self) -> &Path {
        &self.data.destination
    }

    /// Snapshot of the session environment taken when the surface opened
    pub fn environment(&self) -> &Environment {
        &self.data.environment
    }

    /// Snapshot of the session hook lists taken when the surface opened
    pub fn hooks(&self) -> &Hooks {
        &self.data.hooks
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// This fill-in is done; move on to the next one
    pub fn advance(&self) -> Result<Step> {
        self.session.advance()
    }

    /// Put this surface at the back of the queue and move on.
    ///
    /// Fails with [`Error::NothingToDefer`] unless this is the surface
    /// currently being presented.
    pub fn defer(&self) -> Result<Step> {
        self.session.defer(self)
    }
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.data.id)
            .field("destination", &self.data.destination)
            .finish()
    }
}
