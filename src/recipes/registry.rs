//! Recipe registry for managing available looks.

use crate::core::error::ValidationError;
use crate::core::recipe::{Category, Recipe, RecipeMetadata};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry entry containing the recipe and its cached metadata.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Shared, stateless recipe.
    pub recipe: Arc<dyn Recipe>,
    /// Cached metadata (avoids rebuilding it on every lookup).
    pub metadata: RecipeMetadata,
}

/// Registry for all available recipes.
///
/// Iteration follows registration order, which is also the order recipes are
/// offered to the user; the first one registered is the default look.
#[derive(Clone, Default)]
pub struct RecipeRegistry {
    /// Recipes indexed by their unique ID.
    recipes: IndexMap<String, RegistryEntry>,
}

impl RecipeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with built-in recipes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::recipes::register_all(&mut registry);
        registry
    }

    /// Register a recipe. A recipe with the same ID replaces the old one in place.
    pub fn register(&mut self, recipe: impl Recipe + 'static) {
        let metadata = recipe.metadata();
        let id = metadata.id.clone();
        log::debug!("Registering recipe '{}'", id);
        self.recipes.insert(
            id,
            RegistryEntry {
                recipe: Arc::new(recipe),
                metadata,
            },
        );
    }

    /// Get a recipe by ID.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Recipe>> {
        self.recipes.get(id).map(|e| Arc::clone(&e.recipe))
    }

    /// Get a recipe by ID, or a validation error naming it.
    pub fn require(&self, id: &str) -> Result<Arc<dyn Recipe>, ValidationError> {
        self.get(id)
            .ok_or_else(|| ValidationError::UnknownRecipe(id.to_string()))
    }

    /// Get metadata for a recipe.
    pub fn metadata(&self, id: &str) -> Option<&RecipeMetadata> {
        self.recipes.get(id).map(|e| &e.metadata)
    }

    /// Check if a recipe is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.recipes.contains_key(id)
    }

    /// Get all registered recipe IDs in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(|s| s.as_str())
    }

    /// Get all registered recipes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.recipes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The look applied to freshly imported photos.
    pub fn default_recipe(&self) -> Option<&str> {
        self.recipes.keys().next().map(|s| s.as_str())
    }

    /// Search recipes by id, name, description or tag.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.recipes
            .iter()
            .filter(|(_, entry)| {
                let meta = &entry.metadata;
                meta.id.to_lowercase().contains(&query)
                    || meta.name.to_lowercase().contains(&query)
                    || meta.description.to_lowercase().contains(&query)
                    || meta.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Get recipes grouped by category for display.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<&RecipeMetadata>> {
        let mut grouped: IndexMap<Category, Vec<&RecipeMetadata>> = IndexMap::new();
        for entry in self.recipes.values() {
            grouped
                .entry(entry.metadata.category)
                .or_default()
                .push(&entry.metadata);
        }
        grouped
    }

    /// Unregister a recipe.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.recipes.shift_remove(id).is_some()
    }

    /// Get the total number of registered recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl std::fmt::Debug for RecipeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeRegistry")
            .field("recipes", &self.recipes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builtins() {
        let registry = RecipeRegistry::with_builtins();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec![
                "caramel_fade",
                "arctic_mist",
                "polar_radiance",
                "patina_grain",
                "silver_grit",
                "retro_pixel"
            ]
        );
        assert_eq!(registry.default_recipe(), Some("caramel_fade"));
        assert!(registry.contains("retro_pixel"));
        assert!(registry.get("sparkle").is_none());
    }

    #[test]
    fn test_registry_search() {
        let registry = RecipeRegistry::with_builtins();
        let results = registry.search("grain");
        assert!(results.contains(&"patina_grain"));
        assert!(results.contains(&"silver_grit"));
        assert!(!results.contains(&"retro_pixel"));
    }

    #[test]
    fn test_require_unknown() {
        let registry = RecipeRegistry::with_builtins();
        assert_eq!(
            registry.require("sparkle").err(),
            Some(ValidationError::UnknownRecipe("sparkle".to_string()))
        );
    }

    #[test]
    fn test_unregister_shifts_default() {
        let mut registry = RecipeRegistry::with_builtins();
        assert!(registry.unregister("caramel_fade"));
        assert_eq!(registry.default_recipe(), Some("arctic_mist"));
        assert_eq!(registry.len(), 5);
        assert!(!registry.unregister("caramel_fade"));
    }

    #[test]
    fn test_grouped_by_category() {
        let registry = RecipeRegistry::with_builtins();
        let grouped = registry.grouped_by_category();
        assert_eq!(grouped[&Category::Cool].len(), 2);
        assert_eq!(grouped[&Category::Pixel][0].id, "retro_pixel");
    }
}
