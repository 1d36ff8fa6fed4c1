//! Drawing metadata attached to nodes for the rendering collaborator.
//! Carries no simulation semantics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub color: String,
    pub shape: String,
    pub size: u32,
}

impl NodeStyle {
    pub fn host() -> Self {
        Self {
            color: "#0284C7".to_string(),
            shape: "circle".to_string(),
            size: 26,
        }
    }

    pub fn switch() -> Self {
        Self {
            color: "#65A30D".to_string(),
            shape: "rect".to_string(),
            size: 26,
        }
    }

    pub fn router() -> Self {
        Self {
            color: "#14B8A6".to_string(),
            shape: "rect".to_string(),
            size: 26,
        }
    }

    pub fn cloud() -> Self {
        Self {
            color: "#7C3AED".to_string(),
            shape: "circle".to_string(),
            size: 50,
        }
    }
}
