//! Core IngestionPipeline implementation

use crate::config::IngestConfig;
use crate::error::IngestionError;
use crate::form::{normalize_tags, Submission};
use acervo_domain::traits::{CreateError, DocumentStore, ImageStore, TextExtractor, Upload};
use acervo_domain::{Document, DocumentInput};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// What happened to the transcription upload of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionStatus {
    /// No transcription file was submitted
    Absent,
    /// Text was extracted from the submitted file
    Extracted,
    /// Extraction failed; the document was stored with an empty transcription
    Failed(String),
}

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// The stored document
    pub document: Document,
    /// Outcome of the transcription step
    pub transcription: TranscriptionStatus,
}

/// The IngestionPipeline validates, enriches and persists submissions
///
/// The store is shared with readers through `Arc<Mutex<_>>`; the lock is only
/// held for the single `create` call.
pub struct IngestionPipeline<X, S, I>
where
    X: TextExtractor,
    S: DocumentStore,
    I: ImageStore,
{
    extractor: Arc<X>,
    store: Arc<Mutex<S>>,
    images: I,
    config: IngestConfig,
}

impl<X, S, I> IngestionPipeline<X, S, I>
where
    X: TextExtractor + Send + Sync + 'static,
    X::Error: Display,
    S: DocumentStore,
    S::Error: Display,
    I: ImageStore,
    I::Error: Display,
{
    /// Create a new IngestionPipeline
    pub fn new(extractor: X, store: Arc<Mutex<S>>, images: I, config: IngestConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            store,
            images,
            config,
        }
    }

    /// The shared document store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// The shared text extractor
    pub fn extractor(&self) -> Arc<X> {
        Arc::clone(&self.extractor)
    }

    /// The image store uploads are written to
    pub fn images(&self) -> &I {
        &self.images
    }

    /// Ingest a submission and return the stored document
    pub async fn ingest(&self, submission: Submission) -> Result<Document, IngestionError> {
        self.ingest_with_report(submission)
            .await
            .map(|report| report.document)
    }

    /// Ingest a submission, also reporting how the transcription step went
    ///
    /// Either exactly one document is persisted, or the call fails and
    /// nothing is persisted.
    pub async fn ingest_with_report(
        &self,
        submission: Submission,
    ) -> Result<IngestReport, IngestionError> {
        let Submission {
            form,
            image,
            transcription,
        } = submission;

        let fields = form.required()?;
        let tags = normalize_tags(form.tags.as_deref());

        info!("Ingesting '{}' ({}, {})", fields.title, fields.date, fields.category);

        if let Some(image) = image.as_ref().filter(|u| !u.is_empty()) {
            if image.bytes.len() > self.config.max_image_bytes {
                return Err(IngestionError::ImageTooLarge {
                    size: image.bytes.len(),
                    limit: self.config.max_image_bytes,
                });
            }
        }

        let (transcription, transcription_status) = match transcription.filter(|u| !u.is_empty()) {
            Some(upload) => self.transcribe(upload).await,
            None => (String::new(), TranscriptionStatus::Absent),
        };

        let stored_image = match image.filter(|u| !u.is_empty()) {
            Some(image) => Some(
                self.images
                    .store(&image)
                    .map_err(|e| IngestionError::ImageStorage(e.to_string()))?,
            ),
            None => None,
        };

        let input = DocumentInput {
            title: fields.title,
            date: fields.date,
            source: fields.source,
            category: fields.category,
            tags,
            image_url: stored_image.clone().or_else(|| self.config.placeholder()),
            transcription,
        };

        let created = match self.store.lock() {
            Ok(mut store) => store.create(input).map_err(|e| match e {
                CreateError::Invalid(v) => IngestionError::Invalid(v),
                CreateError::Backend(b) => IngestionError::StoreUnavailable(b.to_string()),
            }),
            Err(e) => Err(IngestionError::StoreUnavailable(format!(
                "Store lock error: {}",
                e
            ))),
        };

        match created {
            Ok(document) => {
                info!("Ingested document {} ('{}')", document.id, document.title);
                Ok(IngestReport {
                    document,
                    transcription: transcription_status,
                })
            }
            Err(e) => {
                if let Some(url) = stored_image {
                    if let Err(discard_err) = self.images.discard(&url) {
                        warn!("Failed to discard orphaned image {}: {}", url, discard_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Run extraction on a blocking worker; failures become an empty transcription
    async fn transcribe(&self, upload: Upload) -> (String, TranscriptionStatus) {
        let extractor = Arc::clone(&self.extractor);
        let label = upload
            .file_name
            .clone()
            .unwrap_or_else(|| "<unnamed>".to_string());

        let outcome = tokio::task::spawn_blocking(move || {
            extractor.extract(&upload.bytes).map_err(|e| e.to_string())
        })
        .await
        .unwrap_or_else(|e| Err(format!("Task join error: {}", e)));

        match outcome {
            Ok(text) => {
                debug!("Extracted {} chars of transcription from {}", text.len(), label);
                (text, TranscriptionStatus::Extracted)
            }
            Err(reason) => {
                warn!(
                    "Transcription extraction failed for {}: {}; storing empty transcription",
                    label, reason
                );
                (String::new(), TranscriptionStatus::Failed(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::SubmissionForm;
    use acervo_domain::DocumentId;
    use std::convert::Infallible;

    /// Extractor that echoes UTF-8 input and rejects anything starting with '!'
    struct EchoExtractor;

    impl TextExtractor for EchoExtractor {
        type Error = String;

        fn extract(&self, bytes: &[u8]) -> Result<String, Self::Error> {
            match bytes.first() {
                Some(b'!') => Err("unreadable".to_string()),
                _ => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
            }
        }
    }

    /// In-memory store; `fail_writes` simulates an unreachable backend
    #[derive(Default)]
    struct VecStore {
        documents: Vec<Document>,
        fail_writes: bool,
    }

    impl DocumentStore for VecStore {
        type Error = String;

        fn create(&mut self, input: DocumentInput) -> Result<Document, CreateError<Self::Error>> {
            input.validate()?;
            if self.fail_writes {
                return Err(CreateError::Backend("connection refused".to_string()));
            }
            let doc = Document::from_input(
                DocumentId::new(),
                input,
                acervo_domain::document::creation_timestamp(),
            );
            self.documents.push(doc.clone());
            Ok(doc)
        }

        fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>, Self::Error> {
            Ok(self.documents.iter().find(|d| d.id == id).cloned())
        }

        fn list_all(&self) -> Result<Vec<Document>, Self::Error> {
            Ok(self.documents.clone())
        }

        fn ping(&self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Image store that records what it was asked to keep and discard
    #[derive(Default)]
    struct RecordingImages {
        discarded: Mutex<Vec<String>>,
    }

    impl ImageStore for RecordingImages {
        type Error = Infallible;

        fn store(&self, image: &Upload) -> Result<String, Self::Error> {
            Ok(format!("/images/{}.png", image.bytes.len()))
        }

        fn discard(&self, url: &str) -> Result<(), Self::Error> {
            self.discarded.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn form() -> SubmissionForm {
        SubmissionForm {
            title: Some("Decreto Nº 21.076".to_string()),
            date: Some("1932-02-24".to_string()),
            source: Some("Arquivo Nacional".to_string()),
            category: Some("Legislação".to_string()),
            tags: Some("Voto Feminino, Marco Histórico".to_string()),
        }
    }

    fn pipeline(store: VecStore) -> IngestionPipeline<EchoExtractor, VecStore, RecordingImages> {
        IngestionPipeline::new(
            EchoExtractor,
            Arc::new(Mutex::new(store)),
            RecordingImages::default(),
            IngestConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_transcription_extracted() {
        let pipeline = pipeline(VecStore::default());
        let submission = Submission {
            transcription: Some(Upload::from_bytes("Art. 1º")),
            ..Submission::from_form(form())
        };

        let report = pipeline.ingest_with_report(submission).await.unwrap();
        assert_eq!(report.document.transcription, "Art. 1º");
        assert_eq!(report.transcription, TranscriptionStatus::Extracted);
    }

    #[tokio::test]
    async fn test_failed_extraction_reported_not_fatal() {
        let pipeline = pipeline(VecStore::default());
        let submission = Submission {
            transcription: Some(Upload::from_bytes("!garbage")),
            ..Submission::from_form(form())
        };

        let report = pipeline.ingest_with_report(submission).await.unwrap();
        assert_eq!(report.document.transcription, "");
        assert_eq!(
            report.transcription,
            TranscriptionStatus::Failed("unreadable".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_uploads_treated_as_absent() {
        let pipeline = pipeline(VecStore::default());
        let submission = Submission {
            image: Some(Upload::default()),
            transcription: Some(Upload::default()),
            ..Submission::from_form(form())
        };

        let report = pipeline.ingest_with_report(submission).await.unwrap();
        assert_eq!(report.transcription, TranscriptionStatus::Absent);
        assert_eq!(
            report.document.image_url.as_deref(),
            Some(crate::config::DEFAULT_PLACEHOLDER_IMAGE)
        );
    }

    #[tokio::test]
    async fn test_image_reference_stored() {
        let pipeline = pipeline(VecStore::default());
        let submission = Submission {
            image: Some(Upload::from_bytes(vec![1u8, 2, 3])),
            ..Submission::from_form(form())
        };

        let doc = pipeline.ingest(submission).await.unwrap();
        assert_eq!(doc.image_url.as_deref(), Some("/images/3.png"));
    }

    #[tokio::test]
    async fn test_oversized_image_rejected_before_persisting() {
        let mut pipeline = pipeline(VecStore::default());
        pipeline.config.max_image_bytes = 2;
        let submission = Submission {
            image: Some(Upload::from_bytes(vec![1u8, 2, 3])),
            ..Submission::from_form(form())
        };

        let result = pipeline.ingest(submission).await;
        assert!(matches!(
            result,
            Err(IngestionError::ImageTooLarge { size: 3, limit: 2 })
        ));
        assert!(pipeline.store().lock().unwrap().documents.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_discards_image() {
        let pipeline = pipeline(VecStore {
            fail_writes: true,
            ..VecStore::default()
        });
        let submission = Submission {
            image: Some(Upload::from_bytes(vec![7u8; 5])),
            ..Submission::from_form(form())
        };

        let result = pipeline.ingest(submission).await;
        assert!(matches!(result, Err(IngestionError::StoreUnavailable(_))));
        assert_eq!(
            *pipeline.images.discarded.lock().unwrap(),
            vec!["/images/5.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_poisoned_store_discards_image() {
        let pipeline = pipeline(VecStore::default());
        let store = pipeline.store();
        let _ = std::thread::spawn(move || {
            let _guard = store.lock().unwrap();
            panic!("writer crashed while holding the store");
        })
        .join();

        let submission = Submission {
            image: Some(Upload::from_bytes(vec![7u8; 4])),
            ..Submission::from_form(form())
        };

        let result = pipeline.ingest(submission).await;
        assert!(matches!(result, Err(IngestionError::StoreUnavailable(_))));
        assert_eq!(
            *pipeline.images.discarded.lock().unwrap(),
            vec!["/images/4.png".to_string()]
        );
    }
}
