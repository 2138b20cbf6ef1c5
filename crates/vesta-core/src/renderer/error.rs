// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for resources and driver objects.

use crate::renderer::api::{PipelineLayoutId, RenderPipelineId, ShaderModuleId, ShaderStage};
use std::fmt;

/// An error related to loading, compiling or instantiating a shader.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source failed to compile into an intermediate representation.
    CompilationError {
        /// The URI or label of the shader.
        label: String,
        /// The stage being compiled.
        stage: ShaderStage,
        /// Detailed error messages from the compiler.
        details: String,
    },
    /// No shader compiler was configured, so source cannot be turned into IL.
    CompilerUnavailable,
    /// The requested shader module could not be found on the device.
    NotFound {
        /// The ID of the shader module that was not found.
        id: ShaderModuleId,
    },
    /// The shader cache blob could not be decoded.
    CorruptCache {
        /// The URI of the persisted cache.
        uri: String,
        /// What went wrong.
        details: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError {
                label,
                stage,
                details,
            } => {
                write!(
                    f,
                    "Shader compilation failed for '{label}' ({stage:?}): {details}"
                )
            }
            ShaderError::CompilerUnavailable => {
                write!(f, "No shader compiler is configured")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Shader module not found for ID: {id:?}")
            }
            ShaderError::CorruptCache { uri, details } => {
                write!(f, "Shader cache '{uri}' is corrupt: {details}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation of layouts and pipelines.
#[derive(Debug)]
pub enum PipelineError {
    /// The backend rejected a bind-set layout or pipeline layout.
    LayoutCreationFailed(String),
    /// The graphics backend failed to compile the full pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// A shader module referenced by the pipeline state is unknown to the device.
    InvalidShaderModuleForPipeline {
        /// The ID of the invalid shader module.
        id: ShaderModuleId,
    },
    /// A pipeline layout referenced by the pipeline state is unknown to the device.
    InvalidPipelineLayout {
        /// The ID of the invalid layout.
        id: PipelineLayoutId,
    },
    /// The specified render pipeline ID is not valid.
    InvalidRenderPipeline {
        /// The ID of the invalid render pipeline.
        id: RenderPipelineId,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::LayoutCreationFailed(msg) => {
                write!(f, "Layout creation failed: {msg}")
            }
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::InvalidShaderModuleForPipeline { id } => {
                write!(f, "Invalid shader module {id:?} in pipeline state")
            }
            PipelineError::InvalidPipelineLayout { id } => {
                write!(f, "Invalid pipeline layout {id:?} in pipeline state")
            }
            PipelineError::InvalidRenderPipeline { id } => {
                write!(f, "Invalid render pipeline ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation, loading or use of a resource.
///
/// This is the error type of every fallible operation of the resource manager
/// and of the object caches. None of these errors are fatal: callers decide
/// whether to retry, substitute a fallback resource, or abort the higher-level
/// operation.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid or stale.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds.
    OutOfBounds,
    /// The source of a resource could not be read or written.
    Io {
        /// The URI being accessed.
        uri: String,
        /// The underlying I/O error message.
        message: String,
    },
    /// The source of a resource was read but could not be parsed.
    Parse {
        /// The URI (or a label for in-memory data).
        uri: String,
        /// What the parser rejected.
        details: String,
    },
    /// The resource type does not implement the requested operation.
    Unsupported {
        /// The resource type name.
        type_name: &'static str,
        /// The operation that was requested.
        operation: &'static str,
    },
    /// A reload was attempted and failed; the previous state is still live.
    ReloadFailed {
        /// The URI that was being reloaded.
        uri: String,
        /// The error that aborted the reload.
        cause: Box<ResourceError>,
    },
}

impl ResourceError {
    /// Wraps an I/O error for `uri`.
    pub fn io(uri: impl Into<String>, err: std::io::Error) -> Self {
        ResourceError::Io {
            uri: uri.into(),
            message: err.to_string(),
        }
    }

    /// Builds a parse error for `uri`.
    pub fn parse(uri: impl Into<String>, details: impl fmt::Display) -> Self {
        ResourceError::Parse {
            uri: uri.into(),
            details: details.to_string(),
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
            ResourceError::Io { uri, message } => {
                write!(f, "I/O error on '{uri}': {message}")
            }
            ResourceError::Parse { uri, details } => {
                write!(f, "Failed to parse '{uri}': {details}")
            }
            ResourceError::Unsupported {
                type_name,
                operation,
            } => {
                write!(f, "Resource type '{type_name}' does not support '{operation}'")
            }
            ResourceError::ReloadFailed { uri, cause } => {
                write!(f, "Reload of '{uri}' failed: {cause}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            ResourceError::ReloadFailed { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}
