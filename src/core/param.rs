//! Parameter definitions and constraints for recipe tunables.
//!
//! Each recipe declares its tunables up front with a default and a valid
//! range. Callers override a subset through a [`ParameterSet`]; resolving the
//! set against the definitions checks every override and fills in defaults,
//! so pipeline constructors only ever see complete, in-range values.

use crate::core::error::ValidationError;
use crate::core::types::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// UI hints for parameter display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "widget", content = "options")]
pub enum UiHint {
    /// Default input widget based on type
    #[default]
    Default,
    /// Slider for numeric values
    Slider {
        /// Whether to use logarithmic scale
        logarithmic: bool,
    },
    /// Checkbox for booleans
    Checkbox,
    /// Spin box for integers
    SpinBox,
    /// Angle input, in degrees
    Angle,
    /// Colour temperature in Kelvin
    Temperature,
}

/// Constraints that can be applied to parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Constraint {
    /// Numeric value must be within range [min, max]
    Range { min: f64, max: f64 },
    /// Numeric value must be >= min
    MinValue(f64),
    /// Numeric value must be <= max
    MaxValue(f64),
    /// Numeric value must be a multiple of step
    Step(f64),
    /// Numeric value must be positive (> 0)
    Positive,
    /// Numeric value must be non-negative (>= 0)
    NonNegative,
}

/// Definition of a recipe parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterDefinition {
    /// Unique name within the recipe
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Default value (also fixes the parameter's type)
    pub default_value: Value,
    /// Description for documentation
    pub description: String,
    /// Constraints for validation
    pub constraints: Vec<Constraint>,
    /// UI widget hint
    pub ui_hint: UiHint,
    /// Group name for organizing parameters in UI
    pub group: Option<String>,
}

// ============================================================================
// ParameterDefinition Builder Pattern
// ============================================================================

impl ParameterDefinition {
    /// Create a new parameter definition.
    pub fn new(name: impl Into<String>, default_value: Value) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            default_value,
            description: String::new(),
            constraints: Vec::new(),
            ui_hint: UiHint::Default,
            group: None,
        }
    }

    /// Shorthand for a float parameter.
    pub fn float(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, Value::Float(default))
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a range constraint and set UI hint to slider.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.constraints.push(Constraint::Range { min, max });
        if matches!(self.ui_hint, UiHint::Default) {
            self.ui_hint = UiHint::Slider { logarithmic: false };
        }
        self
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Set the UI hint.
    pub fn with_ui_hint(mut self, ui_hint: UiHint) -> Self {
        self.ui_hint = ui_hint;
        self
    }

    /// Set the parameter group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Validate a value against this parameter's type and constraints.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if !self.default_value.same_kind(value) {
            return Err(ValidationError::TypeMismatch {
                parameter: self.name.clone(),
                expected: self.default_value.type_name().to_string(),
                got: value.type_name().to_string(),
            });
        }

        if value.as_float().is_some_and(|num| !num.is_finite()) {
            return Err(ValidationError::ConstraintViolation {
                parameter: self.name.clone(),
                error: "Value must be a finite number".to_string(),
            });
        }

        for constraint in &self.constraints {
            constraint
                .validate(value)
                .map_err(|error| ValidationError::ConstraintViolation {
                    parameter: self.name.clone(),
                    error,
                })?;
        }

        Ok(())
    }

    /// The `[min, max]` bounds implied by a range constraint, if any.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Range { min, max } => Some((*min, *max)),
            _ => None,
        })
    }
}

/// Convert snake_case name to Title Case display name.
fn name_to_display(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Constraint Validation
// ============================================================================

impl Constraint {
    /// Validate a value against this constraint.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let Some(num) = value.as_float() else {
            return Ok(());
        };

        match self {
            Constraint::Range { min, max } => {
                if num < *min || num > *max {
                    return Err(format!("Value {} is out of range [{}, {}]", num, min, max));
                }
            }
            Constraint::MinValue(min) => {
                if num < *min {
                    return Err(format!("Value {} is below minimum {}", num, min));
                }
            }
            Constraint::MaxValue(max) => {
                if num > *max {
                    return Err(format!("Value {} is above maximum {}", num, max));
                }
            }
            Constraint::Step(step) => {
                let remainder = num % step;
                if remainder.abs() > f64::EPSILON {
                    return Err(format!("Value {} must be a multiple of {}", num, step));
                }
            }
            Constraint::Positive => {
                if num <= 0.0 {
                    return Err(format!("Value {} must be positive", num));
                }
            }
            Constraint::NonNegative => {
                if num < 0.0 {
                    return Err(format!("Value {} must be non-negative", num));
                }
            }
        }

        Ok(())
    }

    /// Get a human-readable description of this constraint.
    pub fn description(&self) -> String {
        match self {
            Constraint::Range { min, max } => format!("Must be between {} and {}", min, max),
            Constraint::MinValue(min) => format!("Must be at least {}", min),
            Constraint::MaxValue(max) => format!("Must be at most {}", max),
            Constraint::Step(step) => format!("Must be a multiple of {}", step),
            Constraint::Positive => "Must be positive".to_string(),
            Constraint::NonNegative => "Must be non-negative".to_string(),
        }
    }
}

// ============================================================================
// Parameter Sets
// ============================================================================

/// Caller-supplied overrides for a recipe's parameters.
///
/// Anything not set here takes the recipe's default when resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: HashMap<String, Value>,
}

impl ParameterSet {
    /// Create an empty set (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style override.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Set an override.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Get an override, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no overrides are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a `name=value` assignment, as given on the command line.
    pub fn parse_assignment(&mut self, assignment: &str) -> Result<(), ValidationError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| ValidationError::MalformedAssignment(assignment.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MalformedAssignment(assignment.to_string()));
        }
        let value = Value::parse(raw)
            .ok_or_else(|| ValidationError::MalformedAssignment(assignment.to_string()))?;
        self.set(name, value);
        Ok(())
    }

    /// Check overrides against `definitions` and fill in defaults.
    pub fn resolve(
        &self,
        recipe: &str,
        definitions: &[ParameterDefinition],
    ) -> Result<ResolvedParameters, ValidationError> {
        for name in self.values.keys() {
            if !definitions.iter().any(|d| &d.name == name) {
                return Err(ValidationError::UnknownParameter {
                    recipe: recipe.to_string(),
                    parameter: name.clone(),
                });
            }
        }

        let mut values = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let value = match self.values.get(&definition.name) {
                Some(value) => {
                    definition.validate(value)?;
                    *value
                }
                None => definition.default_value,
            };
            values.insert(definition.name.clone(), value);
        }

        Ok(ResolvedParameters { values })
    }
}

/// A complete, validated parameter assignment for one recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParameters {
    values: IndexMap<String, Value>,
}

impl ResolvedParameters {
    /// Resolve with no overrides.
    pub fn defaults(definitions: &[ParameterDefinition]) -> Self {
        Self {
            values: definitions
                .iter()
                .map(|d| (d.name.clone(), d.default_value))
                .collect(),
        }
    }

    /// Get a float parameter. Undeclared names read as 0.
    pub fn float(&self, name: &str) -> f32 {
        self.values
            .get(name)
            .and_then(Value::as_float)
            .unwrap_or(0.0) as f32
    }

    /// Get an integer parameter, rounding floats.
    pub fn integer(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Float(f)) => f.round() as i64,
            _ => 0,
        }
    }

    /// Get a boolean parameter. Undeclared names read as false.
    pub fn bool(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Iterate over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definitions() -> Vec<ParameterDefinition> {
        vec![
            ParameterDefinition::float("sepia_intensity", 0.55).with_range(0.0, 1.0),
            ParameterDefinition::float("blur_radius", 0.8)
                .with_range(0.0, 10.0)
                .with_group("Blur"),
            ParameterDefinition::new("levels", Value::Integer(6))
                .with_constraint(Constraint::Positive),
        ]
    }

    #[test]
    fn test_parameter_definition_builder() {
        let param = ParameterDefinition::float("vignette_radius", 1.8)
            .with_description("Falloff radius")
            .with_range(0.0, 5.0);

        assert_eq!(param.display_name, "Vignette Radius");
        assert_eq!(param.ui_hint, UiHint::Slider { logarithmic: false });
        assert_eq!(param.range(), Some((0.0, 5.0)));
    }

    #[test]
    fn test_constraint_range_validation() {
        let constraint = Constraint::Range { min: 0.0, max: 100.0 };

        assert!(constraint.validate(&Value::Float(50.0)).is_ok());
        assert!(constraint.validate(&Value::Float(0.0)).is_ok());
        assert!(constraint.validate(&Value::Float(100.0)).is_ok());
        assert!(constraint.validate(&Value::Float(-1.0)).is_err());
        assert!(constraint.validate(&Value::Integer(101)).is_err());
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let resolved = ParameterSet::new()
            .with("blur_radius", Value::Float(2.0))
            .resolve("caramel_fade", &definitions())
            .unwrap();

        assert_eq!(resolved.float("blur_radius"), 2.0);
        assert!((resolved.float("sepia_intensity") - 0.55).abs() < 1e-6);
        assert_eq!(resolved.integer("levels"), 6);
    }

    #[test]
    fn test_resolve_rejects_unknown_and_out_of_range() {
        let unknown = ParameterSet::new()
            .with("grain", Value::Float(1.0))
            .resolve("caramel_fade", &definitions());
        assert!(matches!(unknown, Err(ValidationError::UnknownParameter { .. })));

        let out_of_range = ParameterSet::new()
            .with("sepia_intensity", Value::Float(1.5))
            .resolve("caramel_fade", &definitions());
        assert!(matches!(
            out_of_range,
            Err(ValidationError::ConstraintViolation { .. })
        ));

        let wrong_type = ParameterSet::new()
            .with("levels", Value::Boolean(true))
            .resolve("caramel_fade", &definitions());
        assert!(matches!(wrong_type, Err(ValidationError::TypeMismatch { .. })));
    }

    #[test]
    fn test_resolve_rejects_non_finite() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = ParameterSet::new()
                .with("blur_radius", Value::Float(bad))
                .resolve("caramel_fade", &definitions());
            assert!(
                matches!(result, Err(ValidationError::ConstraintViolation { .. })),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_integer_accepts_float_override() {
        let resolved = ParameterSet::new()
            .with("blur_radius", Value::Integer(3))
            .resolve("caramel_fade", &definitions())
            .unwrap();
        assert_eq!(resolved.float("blur_radius"), 3.0);
    }

    #[test]
    fn test_parse_assignment() {
        let mut set = ParameterSet::new();
        set.parse_assignment("blur_radius=1.5").unwrap();
        set.parse_assignment(" levels = 4").unwrap();
        assert_eq!(set.get("blur_radius"), Some(&Value::Float(1.5)));
        assert_eq!(set.get("levels"), Some(&Value::Integer(4)));
        assert!(set.parse_assignment("nonsense").is_err());
        assert!(set.parse_assignment("=1").is_err());
        assert!(set.parse_assignment("x=abc").is_err());
    }

    #[test]
    fn test_name_to_display() {
        assert_eq!(name_to_display("cool_amount"), "Cool Amount");
        assert_eq!(name_to_display("levels"), "Levels");
    }
}
