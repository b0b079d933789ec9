//! Jewelry categories supported by the overlay engine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tracking::ModelKind;

/// Jewelry category. Picks the anchor fields and the placement formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Earrings,
    Necklace,
    Ring,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Earrings, Category::Necklace, Category::Ring];

    /// Which landmark pipeline feeds this category
    pub fn model_kind(&self) -> ModelKind {
        match self {
            Category::Earrings | Category::Necklace => ModelKind::Face,
            Category::Ring => ModelKind::Hand,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Earrings => "earrings",
            Category::Necklace => "necklace",
            Category::Ring => "ring",
        }
    }

    /// Parse catalog category names ("earring", "Rings", ...)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "earring" | "earrings" => Some(Category::Earrings),
            "necklace" | "necklaces" | "pendant" => Some(Category::Necklace),
            "ring" | "rings" => Some(Category::Ring),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
