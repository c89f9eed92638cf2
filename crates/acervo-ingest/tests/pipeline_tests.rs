//! Integration tests for acervo-ingest
//!
//! These run the pipeline against the SQLite store, the .docx extractor and a
//! filesystem image store in a temporary directory.

use acervo_domain::traits::{DocumentStore, Upload};
use acervo_extractor::{DocxExtractor, DOCUMENT_PART};
use acervo_ingest::{
    FsImageStore, IngestConfig, IngestionError, IngestionPipeline, Submission, SubmissionForm,
    TranscriptionStatus, DEFAULT_PLACEHOLDER_IMAGE,
};
use acervo_store::SqliteStore;
use chrono::NaiveDate;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

type Pipeline = IngestionPipeline<DocxExtractor, SqliteStore, FsImageStore>;

fn setup() -> (Pipeline, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Mutex::new(SqliteStore::new(":memory:").unwrap()));
    let images = FsImageStore::new(dir.path().join("images"), "/images").unwrap();
    let pipeline = IngestionPipeline::new(
        DocxExtractor::default(),
        store,
        images,
        IngestConfig::default(),
    );
    (pipeline, dir)
}

fn decreto_form() -> SubmissionForm {
    SubmissionForm {
        title: Some("Decreto Nº 21.076".to_string()),
        date: Some("1932-02-24".to_string()),
        source: Some("Arquivo Nacional".to_string()),
        category: Some("Legislação".to_string()),
        tags: Some("Voto Feminino, Marco Histórico".to_string()),
    }
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(DOCUMENT_PART, SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn stored_count(pipeline: &Pipeline) -> usize {
    pipeline.store().lock().unwrap().list_all().unwrap().len()
}

#[tokio::test]
async fn test_text_only_submission() {
    let (pipeline, _dir) = setup();

    let doc = pipeline
        .ingest(Submission::from_form(decreto_form()))
        .await
        .unwrap();

    assert_eq!(doc.title, "Decreto Nº 21.076");
    assert_eq!(doc.date, NaiveDate::from_ymd_opt(1932, 2, 24).unwrap());
    assert_eq!(doc.tags, vec!["Voto Feminino", "Marco Histórico"]);
    assert_eq!(doc.transcription, "");
    assert_eq!(doc.image_url.as_deref(), Some(DEFAULT_PLACEHOLDER_IMAGE));

    let stored = pipeline
        .store()
        .lock()
        .unwrap()
        .get_by_id(doc.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, doc);
}

#[tokio::test]
async fn test_docx_transcription_extracted() {
    let (pipeline, _dir) = setup();
    let submission = Submission {
        transcription: Some(Upload {
            file_name: Some("decreto.docx".to_string()),
            content_type: None,
            bytes: docx(&["O Chefe do Governo Provisório", "Art. 1º"]),
        }),
        ..Submission::from_form(decreto_form())
    };

    let report = pipeline.ingest_with_report(submission).await.unwrap();
    assert_eq!(report.transcription, TranscriptionStatus::Extracted);
    assert_eq!(
        report.document.transcription,
        "O Chefe do Governo Provisório\nArt. 1º"
    );
}

#[tokio::test]
async fn test_malformed_transcription_still_ingested() {
    let (pipeline, _dir) = setup();
    let submission = Submission {
        transcription: Some(Upload::from_bytes(b"definitely not a zip archive".to_vec())),
        ..Submission::from_form(decreto_form())
    };

    let report = pipeline.ingest_with_report(submission).await.unwrap();
    assert_eq!(report.document.transcription, "");
    assert!(matches!(report.transcription, TranscriptionStatus::Failed(_)));
    assert_eq!(stored_count(&pipeline), 1);
}

#[tokio::test]
async fn test_image_written_and_referenced() {
    let (pipeline, dir) = setup();
    let submission = Submission {
        image: Some(Upload {
            file_name: Some("scan.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }),
        ..Submission::from_form(decreto_form())
    };

    let doc = pipeline.ingest(submission).await.unwrap();
    let url = doc.image_url.unwrap();
    assert!(url.starts_with("/images/"));

    let file_name = url.trim_start_matches("/images/");
    let on_disk = std::fs::read(dir.path().join("images").join(file_name)).unwrap();
    assert_eq!(on_disk, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_missing_fields_persist_nothing() {
    let (pipeline, _dir) = setup();

    for field in ["title", "date", "source", "category"] {
        let mut form = decreto_form();
        form.set_field(field, "  ".to_string());

        let result = pipeline.ingest(Submission::from_form(form)).await;
        match result {
            Err(IngestionError::MissingField(missing)) => assert_eq!(missing, field),
            other => panic!("expected MissingField({}), got {:?}", field, other),
        }
    }

    assert_eq!(stored_count(&pipeline), 0);
}

#[tokio::test]
async fn test_invalid_date_persists_nothing() {
    let (pipeline, _dir) = setup();
    let mut form = decreto_form();
    form.date = Some("24/02/1932".to_string());

    let err = pipeline.ingest(Submission::from_form(form)).await.unwrap_err();
    assert_eq!(err.field(), Some("date"));
    assert_eq!(stored_count(&pipeline), 0);
}

#[tokio::test]
async fn test_oversized_image_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Mutex::new(SqliteStore::new(":memory:").unwrap()));
    let images = FsImageStore::new(dir.path().join("images"), "/images").unwrap();
    let config = IngestConfig {
        max_image_bytes: 4,
        ..IngestConfig::default()
    };
    let pipeline = IngestionPipeline::new(DocxExtractor::default(), store, images, config);

    let submission = Submission {
        image: Some(Upload::from_bytes(vec![0u8; 5])),
        ..Submission::from_form(decreto_form())
    };

    let result = pipeline.ingest(submission).await;
    assert!(matches!(
        result,
        Err(IngestionError::ImageTooLarge { size: 5, limit: 4 })
    ));
    assert_eq!(stored_count(&pipeline), 0);
    assert_eq!(
        std::fs::read_dir(dir.path().join("images")).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_each_success_adds_exactly_one_record() {
    let (pipeline, _dir) = setup();

    let mut ids = Vec::new();
    for n in 1..=3 {
        let mut form = decreto_form();
        form.title = Some(format!("Documento {}", n));
        ids.push(pipeline.ingest(Submission::from_form(form)).await.unwrap().id);
        assert_eq!(stored_count(&pipeline), n);
    }

    let listed: Vec<_> = pipeline
        .store()
        .lock()
        .unwrap()
        .list_all()
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(listed, ids);
}
