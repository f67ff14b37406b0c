use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the binned simulation core and its configuration layer.
///
/// Library code returns these instead of panicking; the binary wraps them in
/// `anyhow` at the top level.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid constant, domain size, thread count or scenario value.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A particle (or a position being located) lies outside `[0, size]`.
    #[error("{} at ({x}, {y}) is outside the domain [0, {size}]", subject(.index))]
    OutOfDomain {
        index: Option<usize>,
        x: f64,
        y: f64,
        size: f64,
    },

    /// Wall reflection did not bring a coordinate back inside the domain.
    #[error("wall reflection exceeded {limit} iterations (coordinate {coordinate})")]
    ReflectionLimit { limit: usize, coordinate: f64 },

    /// Grid membership no longer matches particle positions.
    #[error("grid membership violated: {0}")]
    Membership(String),

    /// Worker pool could not be created.
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn subject(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("particle {i}"),
        None => "position".to_string(),
    }
}
