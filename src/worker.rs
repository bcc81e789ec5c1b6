//! Background units of work.
//!
//! The [`Controller`] lives on the interactive thread and owns the
//! [`Session`]. Imports and re-renders run on the rayon pool and report back
//! over a crossbeam channel; nothing touches the session until [`Controller::pump`]
//! drains those events on the interactive thread.
//!
//! At most one import is in flight. Starting another raises the previous
//! batch's cancel flag and bumps the session generation, so anything the old
//! unit still sends is dropped.

use crate::config::AppConfig;
use crate::core::error::{ImportError, ValidationError};
use crate::core::param::ParameterSet;
use crate::core::recipe::Recipe;
use crate::import::{ImportBatch, DEFAULT_TARGET_WIDTH, MAX_SELECTION};
use crate::recipes::RecipeRegistry;
use crate::render::RenderEngine;
use crate::review::{Preferences, ReviewDecision, ReviewThrottle};
use crate::session::{ImportTicket, PhotoItem, Session, SessionEvent};
use chrono::Utc;
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Settings the controller runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Working width photos are downscaled to.
    pub target_width: u32,
    /// Most photos accepted per import.
    pub max_selection: usize,
    /// Recipe applied to freshly imported photos.
    pub default_recipe: String,
    /// Review prompt rules.
    pub review: ReviewThrottle,
    /// Where preferences are persisted. `None` keeps them in memory.
    pub preferences_path: Option<PathBuf>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            max_selection: MAX_SELECTION,
            default_recipe: "caramel_fade".to_string(),
            review: ReviewThrottle::default(),
            preferences_path: None,
        }
    }
}

impl From<&AppConfig> for ControllerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            target_width: config.import.target_width,
            max_selection: config.import.max_selection,
            default_recipe: config.render.default_recipe.clone(),
            review: config.review,
            preferences_path: Some(config.preferences_path.clone()),
        }
    }
}

/// Decrements the outstanding-unit counter when a unit ends.
struct UnitGuard(Arc<AtomicUsize>);

impl Drop for UnitGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything an import unit needs, moved onto the pool.
struct ImportJob {
    generation: u64,
    batch: ImportBatch,
    target_width: u32,
    recipe: Option<(String, Arc<dyn Recipe>)>,
    engine: Arc<RenderEngine>,
    cancel: Arc<AtomicBool>,
    sender: Sender<SessionEvent>,
}

impl ImportJob {
    fn run(self) {
        let mut loaded = 0;
        let mut failed = 0;

        for source in &self.batch.sources {
            let result = if self.cancel.load(Ordering::SeqCst) {
                Err(ImportError::Superseded)
            } else {
                source.load(self.target_width)
            };

            let event = match result {
                Ok(original) => {
                    loaded += 1;
                    let item = match &self.recipe {
                        Some((id, recipe)) => {
                            let processed = self.engine.render(
                                Some(&original),
                                recipe.as_ref(),
                                &ParameterSet::new(),
                            );
                            PhotoItem::new(original, id.clone()).with_processed(processed)
                        }
                        None => PhotoItem::new(original, String::new()),
                    };
                    SessionEvent::ItemLoaded {
                        generation: self.generation,
                        item,
                    }
                }
                Err(error) if !error.is_recoverable() => {
                    log::info!(
                        "Import generation {} stopped after {} photos: {}",
                        self.generation,
                        loaded + failed,
                        error
                    );
                    return;
                }
                Err(error) => {
                    failed += 1;
                    SessionEvent::ItemFailed {
                        generation: self.generation,
                        label: source.label(),
                        error: Arc::new(error),
                    }
                }
            };
            if self.sender.send(event).is_err() {
                return;
            }
        }

        log::info!(
            "Imported {} photos ({} failed) in generation {}",
            loaded,
            failed,
            self.generation
        );
        let _ = self.sender.send(SessionEvent::ImportFinished {
            generation: self.generation,
            loaded,
            failed,
        });
    }
}

/// Interactive-thread owner of the session and its background units.
pub struct Controller {
    session: Session,
    engine: Arc<RenderEngine>,
    registry: Arc<RecipeRegistry>,
    settings: ControllerSettings,
    preferences: Preferences,
    sender: Sender<SessionEvent>,
    receiver: Receiver<SessionEvent>,
    cancel: Option<Arc<AtomicBool>>,
    outstanding: Arc<AtomicUsize>,
}

impl Controller {
    /// Create a controller. Persisted preferences are loaded if configured.
    pub fn new(
        engine: Arc<RenderEngine>,
        registry: Arc<RecipeRegistry>,
        settings: ControllerSettings,
    ) -> Self {
        let preferences = match &settings.preferences_path {
            Some(path) => Preferences::load(path).unwrap_or_else(|error| {
                log::warn!("Ignoring preferences at {}: {}", path.display(), error);
                Preferences::default()
            }),
            None => Preferences::default(),
        };
        let (sender, receiver) = unbounded();
        Self {
            session: Session::new(),
            engine,
            registry,
            settings,
            preferences,
            sender,
            receiver,
            cancel: None,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Build engine, registry and settings from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(RenderEngine::with_options(config.render.options())),
            Arc::new(RecipeRegistry::with_builtins()),
            ControllerSettings::from(config),
        )
    }

    /// The session, for reading.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The session, for interactive-thread changes such as moving the current item.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Shared render engine.
    pub fn engine(&self) -> &Arc<RenderEngine> {
        &self.engine
    }

    /// Recipes available to `apply`.
    pub fn registry(&self) -> &Arc<RecipeRegistry> {
        &self.registry
    }

    /// Review counter state.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Number of background units still running.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    fn spawn_unit(&self, unit: impl FnOnce() + Send + 'static) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let guard = UnitGuard(self.outstanding.clone());
        rayon::spawn(move || {
            let _guard = guard;
            unit();
        });
    }

    fn cancel_import(&mut self) {
        if let Some(flag) = self.cancel.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Start importing `batch`, superseding any import in flight.
    ///
    /// Each photo is decoded and rendered with the default recipe in order.
    pub fn import(&mut self, mut batch: ImportBatch) -> ImportTicket {
        self.cancel_import();
        batch.truncate(self.settings.max_selection);
        let ticket = self.session.begin_import();

        let recipe = self
            .registry
            .get(&self.settings.default_recipe)
            .map(|recipe| (self.settings.default_recipe.clone(), recipe))
            .or_else(|| {
                let id = self.registry.default_recipe()?.to_string();
                log::warn!(
                    "Default recipe '{}' is not registered, using '{}'",
                    self.settings.default_recipe,
                    id
                );
                self.registry.get(&id).map(|recipe| (id, recipe))
            });

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(cancel.clone());

        log::info!(
            "Importing {} photos in generation {}",
            batch.len(),
            ticket.generation
        );
        let job = ImportJob {
            generation: ticket.generation,
            batch,
            target_width: self.settings.target_width,
            recipe,
            engine: self.engine.clone(),
            cancel,
            sender: self.sender.clone(),
        };
        self.spawn_unit(move || job.run());
        ticket
    }

    /// Switch the current photo to `recipe_id` and re-render it in the background.
    ///
    /// Returns `Ok(None)` when no photo is loaded. Otherwise the choice is
    /// counted and the review decision returned.
    pub fn apply(&mut self, recipe_id: &str) -> Result<Option<ReviewDecision>, ValidationError> {
        let recipe = self.registry.require(recipe_id)?;
        let Some(request) = self.session.select_recipe(recipe_id) else {
            return Ok(None);
        };

        let engine = self.engine.clone();
        let sender = self.sender.clone();
        self.spawn_unit(move || {
            if let Some(event) = request.run(&engine, recipe.as_ref(), &ParameterSet::new()) {
                let _ = sender.send(event);
            }
        });

        Ok(Some(self.record_choice()))
    }

    fn record_choice(&mut self) -> ReviewDecision {
        let decision = self
            .settings
            .review
            .record_choice(&mut self.preferences, Utc::now());
        if let Some(path) = &self.settings.preferences_path {
            if let Err(error) = self.preferences.save(path) {
                log::warn!("Failed to save preferences to {}: {}", path.display(), error);
            }
        }
        decision
    }

    /// Drain finished work into the session. Returns the number of events handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.session.handle(event);
            handled += 1;
        }
        handled
    }

    /// Block until every background unit has finished, then pump.
    pub fn wait_idle(&mut self) -> usize {
        let mut handled = 0;
        while self.outstanding() > 0 {
            match self.receiver.recv_timeout(Duration::from_millis(10)) {
                Ok(event) => {
                    self.session.handle(event);
                    handled += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        handled + self.pump()
    }

    /// Cancel any import and empty the session.
    pub fn clear(&mut self) {
        self.cancel_import();
        self.session.clear();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.cancel_import();
    }
}
