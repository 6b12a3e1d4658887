//! The S3 HTTP front door for TinBucket.
//!
//! Ties routing, authentication, dispatch, and response formatting into a
//! hyper-compatible service:
//!
//! 1. Health probe and CORS preflight interception
//! 2. Request body buffering (PUT/POST only)
//! 3. Path-style routing to an S3 operation ([`router`])
//! 4. The per-request auth gate ([`auth`])
//! 5. Operation dispatch to the bucket/object/multipart handlers
//! 6. Common response headers and error formatting ([`response`])
//!
//! The business state lives in [`handlers::TinBucketS3`], which owns the
//! metadata store and the filesystem store.

pub mod auth;
pub mod body;
pub mod handlers;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use auth::Principal;
pub use body::S3ResponseBody;
pub use handlers::{ServiceConfig, TinBucketS3};
pub use router::{RoutingContext, resolve_route};
pub use service::S3Service;
