//! Vertex input layouts.

use crate::errors::{Result, RhiError};
use crate::types::Format;

/// One vertex attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub semantic_name: String,
    pub semantic_index: u32,
    pub format: Format,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
    /// Advance per instance instead of per vertex.
    pub per_instance: bool,
    pub instance_step_rate: u32,
}

impl InputElement {
    /// Per-vertex attribute in slot 0.
    #[must_use]
    pub fn per_vertex(semantic_name: &str, format: Format, offset: u32) -> Self {
        Self {
            semantic_name: semantic_name.to_string(),
            semantic_index: 0,
            format,
            input_slot: 0,
            aligned_byte_offset: offset,
            per_instance: false,
            instance_step_rate: 0,
        }
    }

    /// Per-instance attribute in slot 1 (the instance buffer).
    #[must_use]
    pub fn per_instance(semantic_name: &str, semantic_index: u32, format: Format, offset: u32) -> Self {
        Self {
            semantic_name: semantic_name.to_string(),
            semantic_index,
            format,
            input_slot: 1,
            aligned_byte_offset: offset,
            per_instance: true,
            instance_step_rate: 1,
        }
    }
}

/// Ordered vertex attributes. An empty layout is valid (vertex-id driven
/// draws such as fullscreen triangles).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InputLayout {
    elements: Vec<InputElement>,
}

impl InputLayout {
    pub(crate) fn new(elements: &[InputElement]) -> Result<Self> {
        for (i, element) in elements.iter().enumerate() {
            if element.format == Format::Unknown {
                return Err(RhiError::creation(
                    "input layout",
                    format!("element {i} ('{}') has no format", element.semantic_name),
                ));
            }
            let duplicate = elements[..i].iter().any(|other| {
                other.semantic_name == element.semantic_name
                    && other.semantic_index == element.semantic_index
            });
            if duplicate {
                return Err(RhiError::creation(
                    "input layout",
                    format!(
                        "semantic {}{} appears twice",
                        element.semantic_name, element.semantic_index
                    ),
                ));
            }
        }
        Ok(Self {
            elements: elements.to_vec(),
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements(&self) -> &[InputElement] {
        &self.elements
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
