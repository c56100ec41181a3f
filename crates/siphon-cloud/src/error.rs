use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("S3 {operation} failed: HTTP {status} - {body}")]
    S3Response {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("No such container: {0}")]
    ContainerNotFound(String),

    #[error("Container already exists: {0}")]
    ContainerExists(String),

    #[error("Container is not empty: {0}")]
    ContainerNotEmpty(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;

impl From<CloudError> for std::io::Error {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Io(io_err) => io_err,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

impl From<CloudError> for siphon_core::Error {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::InvalidPath(msg) => siphon_core::Error::InvalidPath(msg),
            CloudError::Io(io_err) => siphon_core::Error::Io(io_err),
            CloudError::Config(msg) => siphon_core::Error::Config(msg),
            other => siphon_core::Error::backend(other),
        }
    }
}

impl CloudError {
    /// Recover a `CloudError` that travelled through `std::io` adapters
    pub fn from_io(err: std::io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<CloudError>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(cloud) = inner.downcast::<CloudError>() {
                    return *cloud;
                }
            }
            return CloudError::Runtime("lost wrapped error".to_string());
        }
        CloudError::Io(err)
    }
}
