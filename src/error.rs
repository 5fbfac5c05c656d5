//! Crate error type

use thiserror::Error;

use crate::state::TimerId;

#[derive(Error, Debug)]
pub enum TimerError {
    #[error("unknown timer: {0}")]
    UnknownTimer(TimerId),
    #[error("invalid end time {input:?}: {source}")]
    InvalidEndTime {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}
