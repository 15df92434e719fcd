//! Single-flight, memoised loading of the rendering library.
//!
//! The first caller starts the import; everyone who arrives while it is in
//! flight awaits the same [`Shared`] future, so the import runs once no
//! matter how many first-time callers race. A successful load is cached
//! for the loader's lifetime. A failed load clears the slot so the next call
//! starts a fresh attempt.

use super::{LibrarySource, RenderLibrary};
use crate::config::PDFIUM_LIBRARY_DIR;
use crate::error::LoadError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

type LoadResult = Result<Arc<dyn RenderLibrary>, LoadError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum LoaderState {
    Idle,
    Loading { generation: u64, load: SharedLoad },
    Ready(Arc<dyn RenderLibrary>),
}

/// Lazily loads a [`RenderLibrary`] exactly once.
pub struct LibraryLoader {
    source: Arc<dyn LibrarySource>,
    location: PathBuf,
    state: Mutex<LoaderState>,
    next_generation: Mutex<u64>,
    attempts: AtomicUsize,
}

impl LibraryLoader {
    /// A loader that configures the library with [`PDFIUM_LIBRARY_DIR`].
    pub fn new(source: Arc<dyn LibrarySource>) -> Self {
        Self {
            source,
            location: PathBuf::from(PDFIUM_LIBRARY_DIR),
            state: Mutex::new(LoaderState::Idle),
            next_generation: Mutex::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Location handed to the source on import.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Return the library, importing it on first use.
    pub async fn ensure_loaded(&self) -> LoadResult {
        let (generation, load) = {
            let mut state = self.state();
            match &*state {
                LoaderState::Ready(library) => return Ok(Arc::clone(library)),
                LoaderState::Loading { generation, load } => {
                    debug!("Library load already in flight, awaiting it");
                    (*generation, load.clone())
                }
                LoaderState::Idle => {
                    let generation = self.bump_generation();
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(
                        "Loading rendering library from {} (attempt {})",
                        self.location.display(),
                        attempt
                    );
                    let load = self.source.import(&self.location).shared();
                    *state = LoaderState::Loading {
                        generation,
                        load: load.clone(),
                    };
                    (generation, load)
                }
            }
        };

        let result = load.await;

        let mut state = self.state();
        let current = matches!(
            &*state,
            LoaderState::Loading { generation: g, .. } if *g == generation
        );
        if current {
            *state = match &result {
                Ok(library) => {
                    info!("Rendering library loaded");
                    LoaderState::Ready(Arc::clone(library))
                }
                Err(e) => {
                    warn!("Rendering library failed to load: {}", e);
                    LoaderState::Idle
                }
            };
        }

        result
    }

    /// True once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state(), LoaderState::Ready(_))
    }

    /// Forget an in-flight attempt so the next call starts a new import.
    ///
    /// Callers already awaiting the old attempt still receive its result. A
    /// loaded library is kept.
    pub fn clear_pending(&self) {
        let mut state = self.state();
        if matches!(&*state, LoaderState::Loading { .. }) {
            debug!("Clearing in-flight library load");
            *state = LoaderState::Idle;
        }
    }

    /// Number of imports started so far.
    pub fn load_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn bump_generation(&self) -> u64 {
        let mut next = self
            .next_generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *next += 1;
        *next
    }

    fn state(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("location", &self.location)
            .field("loaded", &self.is_loaded())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}
