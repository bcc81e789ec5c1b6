//! Recipe trait, recipe metadata and pipelines.
//!
//! A recipe is a named, stateless look. Given resolved parameters it builds a
//! [`Pipeline`]: an ordered list of stages run front to back over one
//! source image. Recipes are shared across every photo in a session.

use crate::core::param::{ParameterDefinition, ParameterSet, ResolvedParameters};
use crate::core::error::ValidationError;
use crate::core::stage::Stage;
use serde::{Deserialize, Serialize};

/// Broad family a recipe belongs to, used to group them in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Warm, faded film looks
    Warm,
    /// Cool, airy looks
    Cool,
    /// Monochrome and high-grain looks
    Monochrome,
    /// Low-resolution, quantised looks
    Pixel,
    /// Anything else
    #[default]
    Custom,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Warm => "Warm",
            Category::Cool => "Cool",
            Category::Monochrome => "Monochrome",
            Category::Pixel => "Pixel",
            Category::Custom => "Custom",
        }
    }
}

/// Metadata describing a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeMetadata {
    /// Unique identifier (e.g., "caramel_fade")
    pub id: String,
    /// Human-readable name (e.g., "Caramel Fade")
    pub name: String,
    /// Category for grouping
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Tunable parameters with defaults and ranges
    pub parameters: Vec<ParameterDefinition>,
    /// Searchable tags
    pub tags: Vec<String>,
    /// Whether renders are reproducible without a seed
    pub deterministic: bool,
}

impl RecipeMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> RecipeMetadataBuilder {
        RecipeMetadataBuilder::new(id, name)
    }

    /// Get all parameter names.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Validate overrides against this recipe's parameters.
    pub fn resolve(&self, overrides: &ParameterSet) -> Result<ResolvedParameters, ValidationError> {
        overrides.resolve(&self.id, &self.parameters)
    }
}

/// Builder for RecipeMetadata.
pub struct RecipeMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    parameters: Vec<ParameterDefinition>,
    tags: Vec<String>,
    deterministic: bool,
}

impl RecipeMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::Custom,
            description: String::new(),
            parameters: Vec::new(),
            tags: Vec::new(),
            deterministic: true,
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add multiple tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// Mark as non-deterministic (contains a procedural noise stage).
    pub fn non_deterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    /// Build the metadata.
    pub fn build(self) -> RecipeMetadata {
        RecipeMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            parameters: self.parameters,
            tags: self.tags,
            deterministic: self.deterministic,
        }
    }
}

/// An ordered sequence of stages.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn push(&mut self, stage: impl Stage + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Builder-style append.
    pub fn then(mut self, stage: impl Stage + 'static) -> Self {
        self.push(stage);
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Whether every stage is deterministic.
    pub fn is_deterministic(&self) -> bool {
        self.stages.iter().all(|s| s.is_deterministic())
    }

    /// Iterate over the stages in execution order.
    pub fn stages(&self) -> impl Iterator<Item = &dyn Stage> {
        self.stages.iter().map(|s| s.as_ref())
    }
}

/// A preset look.
///
/// Implementations are stateless: all tuning arrives through
/// [`ResolvedParameters`], which are guaranteed complete and in range.
pub trait Recipe: Send + Sync {
    /// Get the metadata for this recipe.
    ///
    /// This is called during registration and should return consistent values.
    fn metadata(&self) -> RecipeMetadata;

    /// Build the stage sequence for one render.
    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StageError;
    use crate::core::stage::StageContext;
    use crate::core::types::Value;
    use image::RgbaImage;

    #[derive(Debug)]
    struct Noisy;

    impl Stage for Noisy {
        fn name(&self) -> &'static str {
            "noisy"
        }

        fn is_deterministic(&self) -> bool {
            false
        }

        fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
            Ok(input.clone())
        }
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = RecipeMetadata::builder("test_look", "Test Look")
            .category(Category::Warm)
            .description("A test look")
            .parameter(ParameterDefinition::float("amount", 0.5).with_range(0.0, 1.0))
            .tags(["test", "debug"])
            .build();

        assert_eq!(metadata.id, "test_look");
        assert_eq!(metadata.category, Category::Warm);
        assert_eq!(metadata.parameter_names(), vec!["amount"]);
        assert_eq!(metadata.tags.len(), 2);
        assert!(metadata.deterministic);
    }

    #[test]
    fn test_metadata_resolve_names_recipe() {
        let metadata = RecipeMetadata::builder("test_look", "Test Look").build();
        let err = metadata
            .resolve(&ParameterSet::new().with("amount", Value::Float(1.0)))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownParameter {
                recipe: "test_look".to_string(),
                parameter: "amount".to_string(),
            }
        );
    }

    #[test]
    fn test_pipeline_determinism() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_deterministic());
        assert!(pipeline.is_empty());

        let pipeline = pipeline.then(Noisy);
        assert!(!pipeline.is_deterministic());
        assert_eq!(pipeline.stage_names(), vec!["noisy"]);
    }
}
