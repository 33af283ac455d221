//! Ingestion pipeline integration tests
//!
//! Builds small PDF fixtures with lopdf, runs them through extraction,
//! splitting, embedding, and storage, then verifies the stored chunks are
//! retrievable with their source metadata intact.

use std::path::Path;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use placement_rag::ingest::{extract_pages, IngestionPipeline, RecursiveCharacterSplitter};
use placement_rag::retrieval::{
    EmbeddingService, InMemoryVectorStore, MockEmbeddingService, VectorStore,
};
use placement_rag::types::IngestError;

const DIMENSION: usize = 32;

/// Write a single-font PDF with one page per text entry. An empty string
/// produces a page with no text content.
fn write_pdf(path: &Path, page_texts: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn pipeline_with_store() -> (IngestionPipeline, Arc<InMemoryVectorStore>) {
    let store = Arc::new(InMemoryVectorStore::new(DIMENSION));
    let pipeline = IngestionPipeline::new(
        RecursiveCharacterSplitter::new(200, 20),
        Arc::new(MockEmbeddingService::new(DIMENSION)),
        Arc::clone(&store) as Arc<dyn VectorStore>,
        10,
    );
    (pipeline, store)
}

#[test]
fn test_extract_pages_reads_generated_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handbook.pdf");
    write_pdf(
        &path,
        &[
            "Placement drives begin in the seventh semester.",
            "Internship conversion requires SPC approval.",
        ],
    );

    let pages = extract_pages(&path).unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert!(pages[0].text.contains("seventh semester"));
    assert_eq!(pages[1].number, 2);
    assert!(pages[1].text.contains("SPC approval"));
}

#[test]
fn test_extract_pages_skips_empty_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sparse.pdf");
    write_pdf(
        &path,
        &["First page with text.", "", "Third page with text."],
    );

    let pages = extract_pages(&path).unwrap();

    let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 3]);
}

#[test]
fn test_extract_pages_all_empty_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.pdf");
    write_pdf(&path, &[""]);

    let result = extract_pages(&path);
    assert!(matches!(result, Err(IngestError::EmptyDocument { .. })));
}

#[tokio::test]
async fn test_ingest_pdf_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handbook.pdf");
    write_pdf(
        &path,
        &[
            "Placement drives begin in the seventh semester.",
            "Internship conversion requires SPC approval.",
        ],
    );

    let (pipeline, store) = pipeline_with_store();
    let report = pipeline.ingest_pdf(&path).await.unwrap();

    assert_eq!(report.source, "handbook.pdf");
    assert_eq!(report.pages, 2);
    assert!(report.chunks >= 2);
    assert_eq!(report.stored, report.chunks);
    assert_eq!(
        store.stats().await.unwrap().points_count,
        report.chunks as u64
    );

    // Probe with any vector; the brute-force store returns everything when
    // no threshold is set.
    let probe = MockEmbeddingService::new(DIMENSION)
        .generate_embedding("probe")
        .await
        .unwrap();
    let results = store.search(probe, 10, None).await.unwrap();

    let first_page_hit = results
        .iter()
        .find(|r| r.text.contains("seventh semester"))
        .expect("first page chunk should be stored");
    assert_eq!(first_page_hit.metadata.source, "handbook.pdf");
    assert_eq!(first_page_hit.metadata.page, 1);

    let second_page_hit = results
        .iter()
        .find(|r| r.text.contains("SPC approval"))
        .expect("second page chunk should be stored");
    assert_eq!(second_page_hit.metadata.page, 2);
}

#[tokio::test]
async fn test_ingested_chunks_are_retrievable_by_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.pdf");
    write_pdf(&path, &["Placement drives begin in the seventh semester."]);

    let (pipeline, store) = pipeline_with_store();
    pipeline.ingest_pdf(&path).await.unwrap();

    // Embed the stored chunk's own text; the identical vector must come
    // back as the best hit with a perfect score.
    let all = store
        .search(
            MockEmbeddingService::new(DIMENSION)
                .generate_embedding("probe")
                .await
                .unwrap(),
            10,
            None,
        )
        .await
        .unwrap();
    let stored_text = all[0].text.clone();

    let query_embedding = MockEmbeddingService::new(DIMENSION)
        .generate_embedding(&stored_text)
        .await
        .unwrap();
    let results = store.search(query_embedding, 3, Some(0.9)).await.unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].text, stored_text);
    assert!((results[0].score - 1.0).abs() < 1e-5);
}
