use std::sync::Arc;

use common::storage::BlobStore;
use nexus::ContainerBuilder;

use crate::config::AppConfig;
use crate::pipeline::{IngestionPipeline, RetrievalPipeline, SchemaCatalog};
use crate::utils::id_token::IdTokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub ingest: Arc<IngestionPipeline>,
    pub retrieve: Arc<RetrievalPipeline>,
    pub schemas: SchemaCatalog,
    pub verifier: Arc<IdTokenVerifier>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn BlobStore>,
        builder: Arc<dyn ContainerBuilder>,
        verifier: IdTokenVerifier,
    ) -> Self {
        let schemas = SchemaCatalog::new(&config.ingest.schema_dir);
        let bucket = &config.storage.bucket;
        let ingest = IngestionPipeline::new(
            Arc::clone(&store),
            bucket.as_str(),
            builder,
            schemas.clone(),
            &config.ingest.staging_dir,
        );
        let retrieve = RetrievalPipeline::new(store, bucket.as_str());

        Self {
            ingest: Arc::new(ingest),
            retrieve: Arc::new(retrieve),
            schemas,
            verifier: Arc::new(verifier),
            config,
        }
    }
}
