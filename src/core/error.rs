use crate::geo::ProjectionError;
use crate::playback::PlaybackState;

/// Errors raised synchronously when a playback session is set up
///
/// Nothing can fail mid-animation: every input is validated by `start`.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("route has no points to animate")]
    EmptyRoute,

    #[error("speed factor must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    #[error("clock is {0:?}; it must be reset before starting again")]
    NotIdle(PlaybackState),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
