//! HTTP clients for the remote inference services.
//!
//! The pipeline talks to two collaborators:
//! - the person detector (`POST /detect`), queried once per accepted frame
//! - the clothing matcher (`/register_person`, `/identify_person`), which
//!   owns all registered-target state; the pipeline refers to targets by
//!   ID only
//!
//! Both clients carry per-request timeouts; a failed request is reported to
//! the caller and never retried here, since the pipeline treats upstream
//! errors as per-item losses.

pub mod detector;
pub mod error;
pub mod matcher;

pub use detector::{DetectorClient, DetectorHealth};
pub use error::{MlClientError, MlClientResult};
pub use matcher::{IdentifyResponse, MatcherClient, RegisterTargetResponse, RegisteredTargets};
