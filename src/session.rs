//! Selection and application flow.
//!
//! A [`Session`] holds the imported photos, which one is current, and for each
//! photo the applied recipe and its cached render. It is owned by the
//! interactive thread; background units talk to it only through
//! [`SessionEvent`]s.
//!
//! Every item carries a revision that is bumped whenever its recipe changes.
//! A render is accepted only if it was produced for the item's current
//! revision, so a slow render of an old recipe can never overwrite a newer one.

use crate::core::error::ImportError;
use crate::core::param::ParameterSet;
use crate::core::recipe::Recipe;
use crate::core::types::SourceImage;
use crate::render::RenderEngine;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Whether anything has been imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No photos.
    Empty,
    /// At least one photo, one of them current.
    Loaded,
}

/// One imported photo and the recipe applied to it.
#[derive(Debug, Clone)]
pub struct PhotoItem {
    /// Stable identity across re-renders.
    pub id: Uuid,
    /// Upright, downscaled source. Never mutated.
    pub original: SourceImage,
    /// Render of `applied` at `revision`, if one has arrived.
    pub processed: Option<RgbaImage>,
    /// Id of the applied recipe.
    pub applied: String,
    /// Bumped on each recipe change.
    pub revision: u64,
}

impl PhotoItem {
    /// A fresh item with nothing rendered yet.
    pub fn new(original: SourceImage, recipe_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            original,
            processed: None,
            applied: recipe_id.into(),
            revision: 0,
        }
    }

    /// Attach an initial render.
    pub fn with_processed(mut self, bitmap: Option<RgbaImage>) -> Self {
        self.processed = bitmap;
        self
    }

    /// What should be displayed: the render, or the original while it is pending.
    pub fn display(&self) -> &RgbaImage {
        self.processed
            .as_ref()
            .unwrap_or_else(|| self.original.pixels())
    }
}

/// Identifies one import batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportTicket {
    /// Import generation; events from older generations are ignored.
    pub generation: u64,
}

/// Results delivered from background units to the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A photo finished decoding and its first render.
    ItemLoaded { generation: u64, item: PhotoItem },
    /// A photo could not be loaded and was skipped.
    ItemFailed {
        generation: u64,
        label: String,
        error: Arc<ImportError>,
    },
    /// The batch is done.
    ImportFinished {
        generation: u64,
        loaded: usize,
        failed: usize,
    },
    /// A re-render after a recipe change.
    Rendered {
        item_id: Uuid,
        revision: u64,
        bitmap: RgbaImage,
    },
}

/// Work for a background render unit.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Item to render.
    pub item_id: Uuid,
    /// Revision the result will be checked against.
    pub revision: u64,
    /// Recipe to apply.
    pub recipe_id: String,
    /// Source pixels (shared, not copied).
    pub source: SourceImage,
}

impl RenderRequest {
    /// Run the render and wrap the result as an event.
    pub fn run(
        &self,
        engine: &RenderEngine,
        recipe: &dyn Recipe,
        overrides: &ParameterSet,
    ) -> Option<SessionEvent> {
        let bitmap = engine.render(Some(&self.source), recipe, overrides)?;
        Some(SessionEvent::Rendered {
            item_id: self.item_id,
            revision: self.revision,
            bitmap,
        })
    }
}

/// A transient notice for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Text to show.
    pub message: String,
    /// When it was raised.
    pub raised_at: DateTime<Utc>,
}

impl Toast {
    /// Raise a notice now.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The selection/application state container.
#[derive(Debug)]
pub struct Session {
    items: Vec<PhotoItem>,
    current: usize,
    generation: u64,
    processing: bool,
    toasts: VecDeque<Toast>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            current: 0,
            generation: 0,
            processing: false,
            toasts: VecDeque::new(),
        }
    }

    /// Empty or loaded.
    pub fn state(&self) -> SessionState {
        if self.items.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Loaded
        }
    }

    /// All photos in import order.
    pub fn items(&self) -> &[PhotoItem] {
        &self.items
    }

    /// Index of the current photo.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The current photo, if any.
    pub fn current(&self) -> Option<&PhotoItem> {
        self.items.get(self.current)
    }

    /// Number of photos.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no photos.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an import is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Current import generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new import. Supersedes any batch in flight and drops all photos.
    pub fn begin_import(&mut self) -> ImportTicket {
        self.generation += 1;
        self.items.clear();
        self.current = 0;
        self.processing = true;
        log::debug!("Import generation {} started", self.generation);
        ImportTicket {
            generation: self.generation,
        }
    }

    /// Apply an event from a background unit. Returns whether it was accepted.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::ItemLoaded { generation, item } => {
                if !self.is_live(generation) {
                    return false;
                }
                self.items.push(item);
                true
            }
            SessionEvent::ItemFailed {
                generation,
                label,
                error,
            } => {
                if !self.is_live(generation) {
                    return false;
                }
                log::warn!("Skipping {}: {}", label, error);
                self.toasts.push_back(Toast::new(error.notice()));
                true
            }
            SessionEvent::ImportFinished {
                generation,
                loaded,
                failed,
            } => {
                if !self.is_live(generation) {
                    return false;
                }
                self.processing = false;
                log::info!(
                    "Import generation {} finished: {} loaded, {} failed",
                    generation,
                    loaded,
                    failed
                );
                true
            }
            SessionEvent::Rendered {
                item_id,
                revision,
                bitmap,
            } => match self.items.iter_mut().find(|item| item.id == item_id) {
                Some(item) if item.revision == revision => {
                    item.processed = Some(bitmap);
                    true
                }
                Some(item) => {
                    log::debug!(
                        "Dropping render of {} at revision {} (now {})",
                        item_id,
                        revision,
                        item.revision
                    );
                    false
                }
                None => false,
            },
        }
    }

    fn is_live(&self, generation: u64) -> bool {
        if generation != self.generation {
            log::debug!(
                "Dropping event from superseded import generation {}",
                generation
            );
            return false;
        }
        true
    }

    /// Make another photo current. Out of range indices are refused.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    /// Switch the current photo to `recipe_id`.
    ///
    /// The cached render is discarded immediately so nothing stale stays
    /// visible; the returned request produces the replacement.
    pub fn select_recipe(&mut self, recipe_id: &str) -> Option<RenderRequest> {
        let item = self.items.get_mut(self.current)?;
        item.applied = recipe_id.to_string();
        item.revision += 1;
        item.processed = None;
        Some(RenderRequest {
            item_id: item.id,
            revision: item.revision,
            recipe_id: item.applied.clone(),
            source: item.original.clone(),
        })
    }

    /// Select and render on the calling thread. Returns whether a render landed.
    pub fn apply(
        &mut self,
        recipe: &dyn Recipe,
        engine: &RenderEngine,
        overrides: &ParameterSet,
    ) -> bool {
        let id = recipe.metadata().id;
        let Some(request) = self.select_recipe(&id) else {
            return false;
        };
        match request.run(engine, recipe, overrides) {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Drop every photo and render. Events still in flight are ignored.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.current = 0;
        self.processing = false;
        log::debug!("Session cleared");
    }

    /// Pop the oldest pending notice.
    pub fn take_toast(&mut self) -> Option<Toast> {
        self.toasts.pop_front()
    }

    /// The final bitmap of the current photo, for export.
    pub fn current_bitmap(&self) -> Option<&RgbaImage> {
        self.current()?.processed.as_ref()
    }
}
