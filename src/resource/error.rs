//! Error types for the elastic IP resource.

use thiserror::Error;

use crate::vpc::ApiError;
use crate::wait::WaitError;

/// Errors raised by elastic IP lifecycle operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ElasticIpError {
    /// Raised when a required configuration block is absent.
    #[error("configuration must contain exactly one `{block}` block")]
    MissingBlock {
        /// Name of the missing block.
        block: &'static str,
    },
    /// Raised when a change cannot be applied in place.
    #[error("changing {field} requires replacing the elastic IP")]
    RequiresReplacement {
        /// Attribute path whose change forces replacement.
        field: &'static str,
    },
    /// Raised when the allocation request fails.
    #[error("error allocating elastic IP")]
    Allocate {
        /// Underlying API failure.
        source: ApiError,
    },
    /// Raised when a freshly allocated address never becomes active. The
    /// identifier is reported so the host can track the allocation.
    #[error("error waiting for elastic IP {id} to become active")]
    WaitActive {
        /// Identifier of the allocated address.
        id: String,
        /// Underlying wait failure.
        source: WaitError<ApiError>,
    },
    /// Raised when fetching the public IP fails for a reason other than
    /// absence.
    #[error("error fetching elastic IP {id}")]
    Fetch {
        /// Public IP identifier.
        id: String,
        /// Underlying API failure.
        source: ApiError,
    },
    /// Raised when fetching the associated bandwidth fails.
    #[error("error fetching bandwidth {id}")]
    FetchBandwidth {
        /// Bandwidth identifier.
        id: String,
        /// Underlying API failure.
        source: ApiError,
    },
    /// Raised when the bandwidth update is rejected.
    #[error("error updating bandwidth {id}")]
    UpdateBandwidth {
        /// Bandwidth identifier.
        id: String,
        /// Underlying API failure.
        source: ApiError,
    },
    /// Raised when the port binding update is rejected. Any bandwidth change
    /// applied earlier in the same update stays in effect.
    #[error("error updating publicip {id}")]
    UpdatePort {
        /// Public IP identifier.
        id: String,
        /// Underlying API failure.
        source: ApiError,
    },
    /// Raised when releasing the address does not complete.
    #[error("error deleting elastic IP {id}")]
    Release {
        /// Public IP identifier.
        id: String,
        /// Underlying wait failure.
        source: WaitError<ApiError>,
    },
    /// Raised when an operation needs the address but it no longer exists.
    #[error("elastic IP {id} no longer exists")]
    Gone {
        /// Public IP identifier.
        id: String,
    },
}
