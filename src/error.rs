use thiserror::Error;

/// Errors surfaced by the runtime core.
///
/// Setup failures are fatal to `Renderer::initialize`; the registry errors
/// are recoverable and leave the registry untouched.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A GPU device or resource could not be created.
    #[error("device setup failed: {0}")]
    Setup(String),

    /// A registry insert used a name that is already taken.
    #[error("name already registered: {0}")]
    DuplicateName(String),

    /// A lookup or bind referenced a name that is not in the registry.
    #[error("name not registered: {0}")]
    UnresolvedName(String),

    /// The renderer was driven in an invalid configuration, e.g. no main
    /// scene designated before `initialize`.
    #[error("renderer misconfigured: {0}")]
    Configuration(String),
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;

impl From<wgpu::CreateSurfaceError> for RuntimeError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        Self::Setup(err.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for RuntimeError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        Self::Setup(err.to_string())
    }
}
