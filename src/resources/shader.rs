//! Compiled shader blobs.

use crate::errors::{Result, RhiError};
use crate::types::ShaderStage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDesc {
    pub stage: ShaderStage,
    pub entry_point: String,
    /// Compiled bytecode. The RHI never inspects it.
    pub bytecode: Vec<u8>,
}

impl ShaderDesc {
    #[must_use]
    pub fn new(stage: ShaderStage, entry_point: &str, bytecode: Vec<u8>) -> Self {
        Self {
            stage,
            entry_point: entry_point.to_string(),
            bytecode,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.bytecode.is_empty() {
            return Err(RhiError::creation(
                format!("{:?} shader '{}'", self.stage, self.entry_point),
                "bytecode is empty",
            ));
        }
        if self.entry_point.is_empty() {
            return Err(RhiError::creation(
                format!("{:?} shader", self.stage),
                "entry point is empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Shader {
    pub(crate) desc: ShaderDesc,
}

impl Shader {
    pub(crate) fn new(desc: ShaderDesc) -> Self {
        Self { desc }
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.desc.stage
    }

    #[inline]
    #[must_use]
    pub fn entry_point(&self) -> &str {
        &self.desc.entry_point
    }

    #[inline]
    #[must_use]
    pub fn bytecode(&self) -> &[u8] {
        &self.desc.bytecode
    }
}
