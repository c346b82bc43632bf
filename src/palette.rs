//! Deterministic class-to-color assignment.
//!
//! Class names arriving from any format are deduplicated into a single
//! registry, and each distinct name receives a hue spaced by the golden
//! angle from the previous one. Golden-angle spacing keeps adjacent classes
//! visually distinct no matter how many end up registered, and makes the
//! assignment a pure function of registration order.

use std::collections::HashMap;
use std::fmt;

/// The golden angle in degrees, used to space class hues.
pub const GOLDEN_ANGLE_DEGREES: f64 = 137.50776;

const CLASS_SATURATION: u8 = 70;
const CLASS_LIGHTNESS: u8 = 50;

/// A display color in HSL form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Hue in degrees, [0, 360).
    pub hue: f64,
    /// Saturation percentage.
    pub saturation: u8,
    /// Lightness percentage.
    pub lightness: u8,
}

impl Color {
    /// Returned by [`ClassRegistry::color_of`] for names that were never
    /// registered. Should not be seen on the normal path, where assignment
    /// always precedes lookup.
    pub const FALLBACK: Color = Color {
        hue: 217.0,
        saturation: 89,
        lightness: 61,
    };

    /// The color of the `index`-th registered class (0-indexed).
    fn at_index(index: usize) -> Self {
        Self {
            hue: (index as f64 * GOLDEN_ANGLE_DEGREES) % 360.0,
            saturation: CLASS_SATURATION,
            lightness: CLASS_LIGHTNESS,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({:.1}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// A session-scoped mapping from class name to display color.
///
/// Grows monotonically: a name once assigned keeps its color across every
/// subsequent import in the session. Callers construct one per dataset
/// session and thread it through each ingestion call by `&mut`.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    colors: HashMap<String, Color>,
    order: Vec<(String, Color)>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the color for `name`, registering it first if new.
    ///
    /// The Nth distinct name (0-indexed) receives hue
    /// `(N * GOLDEN_ANGLE_DEGREES) mod 360` at fixed saturation/lightness.
    pub fn assign_color(&mut self, name: &str) -> Color {
        if let Some(color) = self.colors.get(name) {
            return *color;
        }

        let color = Color::at_index(self.order.len());
        self.colors.insert(name.to_string(), color);
        self.order.push((name.to_string(), color));
        color
    }

    /// Returns the assigned color, or [`Color::FALLBACK`] for unknown names.
    pub fn color_of(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::FALLBACK)
    }

    /// Number of distinct registered classes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no class has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates `(name, color)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        self.order.iter().map(|(name, color)| (name.as_str(), *color))
    }
}
