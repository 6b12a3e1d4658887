//! S3 XML codec for TinBucket.
//!
//! Emits the response documents and parses the request bodies of the S3
//! 2006-03-01 RestXml protocol:
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Declaration: `<?xml version="1.0" encoding="UTF-8"?>`
//! - Timestamps: ISO 8601 UTC with milliseconds (`2006-02-03T16:45:09.000Z`)
//! - ETags: quoted hex MD5
//!
//! # Modules
//!
//! - [`serialize`] - response document writers ([`to_xml`])
//! - [`deserialize`] - request body parsers ([`from_xml`])
//! - [`error`] - [`XmlError`] and the flat `<Error>` document renderer

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml};
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3Serialize, to_xml};
