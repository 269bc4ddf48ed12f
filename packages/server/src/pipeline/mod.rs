//! Request-scoped workflows behind the file routes.
//!
//! * [`ingest`]: multipart upload → staged TIFF → NeXus container → blob store.
//! * [`retrieve`]: blob store → container → normalized PNG.
//!
//! Neither keeps state between requests; temp files are removed before a
//! call returns.

mod error;
pub mod ingest;
pub mod retrieve;
pub mod schema;

pub use error::{ErrorKind, PipelineError};
pub use ingest::{IngestReceipt, IngestionPipeline, UploadRequest, UploadedImage};
pub use retrieve::{Download, DownloadKind, Preview, RetrievalPipeline};
pub use schema::{ExperimentType, SchemaCatalog};
