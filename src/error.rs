use thiserror::Error;

/// Failures surfaced by the automaton engine.
///
/// Broken internal invariants (a pending cell seen between steps, counts that
/// do not add up to N²) are not represented here; they trip debug assertions.
#[derive(Debug, Error)]
pub enum AutomatonError {
    /// Parameters that can never describe a valid run.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A grid or histogram buffer could not be reserved.
    #[error("failed to allocate {what} buffer of {len} elements")]
    Allocation { what: &'static str, len: usize },
    /// Writing a rendered frame failed.
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AutomatonError>;

/// Shorthand for bailing out with a configuration error.
macro_rules! config_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::AutomatonError::Configuration(format!($($arg)*)))
    };
}
pub(crate) use config_bail;

/// Reserves a zero-filled buffer, reporting allocation failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(what: &'static str, len: usize, fill: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| AutomatonError::Allocation { what, len })?;
    buf.resize(len, fill);
    Ok(buf)
}
