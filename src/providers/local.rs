//! Local full-text index provider backed by tantivy

use super::traits::*;
use crate::place::{AttributeValue, Place, PlaceSource};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, SchemaBuilder, Value, STORED, STRING, TEXT};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, instrument, warn};

/// Smallest writer arena tantivy accepts for a single thread
const MIN_WRITER_MEMORY: usize = 15_000_000;

#[derive(Debug, Clone, Copy)]
struct PlaceFields {
    key: Field,
    place_id: Field,
    source: Field,
    name: Field,
    address: Field,
    latitude: Field,
    longitude: Field,
    additional_data: Field,
}

impl PlaceFields {
    fn schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        builder.add_text_field("key", STRING | STORED);
        builder.add_text_field("place_id", STRING | STORED);
        builder.add_text_field("source", STRING | STORED);
        builder.add_text_field("name", TEXT | STORED);
        builder.add_text_field("address", TEXT | STORED);
        builder.add_f64_field("latitude", STORED);
        builder.add_f64_field("longitude", STORED);
        builder.add_text_field("additional_data", STORED);
        builder.build()
    }

    fn resolve(schema: &Schema) -> anyhow::Result<Self> {
        Ok(Self {
            key: schema.get_field("key")?,
            place_id: schema.get_field("place_id")?,
            source: schema.get_field("source")?,
            name: schema.get_field("name")?,
            address: schema.get_field("address")?,
            latitude: schema.get_field("latitude")?,
            longitude: schema.get_field("longitude")?,
            additional_data: schema.get_field("additional_data")?,
        })
    }
}

fn index_error(e: tantivy::TantivyError) -> ProviderError {
    ProviderError::Unavailable(format!("index error: {}", e))
}

fn task_error(e: tokio::task::JoinError) -> ProviderError {
    ProviderError::Unavailable(format!("index task failed: {}", e))
}

/// Index handles shared with the blocking pool
struct PlaceIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: PlaceFields,
}

impl PlaceIndex {
    fn text_query(&self, text: &str) -> Box<dyn Query> {
        let mut parser = QueryParser::for_index(&self.index, vec![self.fields.name, self.fields.address]);
        parser.set_field_boost(self.fields.name, 2.0);

        let (query, errors) = parser.parse_query_lenient(text);
        if !errors.is_empty() {
            debug!("Lenient parse of '{}' dropped {} clause(s)", text, errors.len());
        }
        query
    }

    fn id_query(&self, place_id: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(self.fields.place_id, place_id),
            IndexRecordOption::Basic,
        ))
    }

    fn run(&self, query: &dyn Query, limit: usize) -> Result<Vec<Place>, ProviderError> {
        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(query, &TopDocs::with_limit(limit.max(1)))
            .map_err(index_error)?;

        let mut places = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc = searcher.doc::<TantivyDocument>(address).map_err(index_error)?;
            if let Some(place) = self.doc_to_place(&doc) {
                places.push(place);
            }
        }
        Ok(places)
    }

    /// Replace any document with the same key, then make it searchable
    fn upsert(&self, place: &Place) -> Result<(), ProviderError> {
        let doc = self.place_to_doc(place);
        {
            let mut writer = self
                .writer
                .lock()
                .map_err(|_| ProviderError::Unavailable("index writer lock poisoned".to_string()))?;
            writer.delete_term(Term::from_field_text(self.fields.key, &place.key().to_string()));
            writer.add_document(doc).map_err(index_error)?;
            writer.commit().map_err(index_error)?;
        }
        self.reader.reload().map_err(index_error)
    }

    fn doc_to_place(&self, doc: &TantivyDocument) -> Option<Place> {
        let f = &self.fields;
        let text = |field| doc.get_first(field).and_then(|v| v.as_str());
        let number = |field| doc.get_first(field).and_then(|v| v.as_f64());

        let source = match text(f.source)?.parse::<PlaceSource>() {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping indexed document with bad source: {}", e);
                return None;
            }
        };

        let additional_data: BTreeMap<String, AttributeValue> = text(f.additional_data)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        let mut place = Place::new(text(f.place_id)?, text(f.name)?, source)
            .ok()?
            .with_address(text(f.address).unwrap_or_default());
        place = place
            .clone()
            .with_coordinates(number(f.latitude), number(f.longitude))
            .unwrap_or(place);
        place.additional_data = additional_data;
        Some(place)
    }

    fn place_to_doc(&self, place: &Place) -> TantivyDocument {
        let f = &self.fields;
        let mut doc = TantivyDocument::default();
        doc.add_text(f.key, place.key().to_string());
        doc.add_text(f.place_id, &place.place_id);
        doc.add_text(f.source, place.source.as_str());
        doc.add_text(f.name, &place.name);
        doc.add_text(f.address, &place.address);
        if let Some(point) = place.location() {
            doc.add_f64(f.latitude, point.latitude);
            doc.add_f64(f.longitude, point.longitude);
        }
        if let Ok(extra) = serde_json::to_string(&place.additional_data) {
            doc.add_text(f.additional_data, extra);
        }
        doc
    }
}

/// Places persisted locally, searchable by name and address.
///
/// Index reads and commits block, so every call runs on the blocking pool
/// and the async side stays cancellable by the caller's timeout.
pub struct LocalIndexProvider {
    inner: Arc<PlaceIndex>,
    timeout: Duration,
}

impl LocalIndexProvider {
    /// Open the index in `dir`, creating it when missing
    pub fn open(dir: &Path, writer_memory: usize) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index directory {}", dir.display()))?;
        let directory = MmapDirectory::open(dir)
            .with_context(|| format!("Failed to open index directory {}", dir.display()))?;
        let index = Index::open_or_create(directory, PlaceFields::schema())
            .with_context(|| format!("Failed to open place index in {}", dir.display()))?;

        info!("Opened place index in {}", dir.display());
        Self::from_index(index, writer_memory)
    }

    /// Index held entirely in RAM
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::from_index(Index::create_in_ram(PlaceFields::schema()), MIN_WRITER_MEMORY)
    }

    fn from_index(index: Index, writer_memory: usize) -> anyhow::Result<Self> {
        let fields = PlaceFields::resolve(&index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to create index reader")?;
        let writer = index
            .writer_with_num_threads(1, writer_memory.max(MIN_WRITER_MEMORY))
            .context("Failed to create index writer")?;

        Ok(Self {
            inner: Arc::new(PlaceIndex {
                index,
                reader,
                writer: Mutex::new(writer),
                fields,
            }),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of live documents
    pub fn num_docs(&self) -> u64 {
        self.inner.reader.searcher().num_docs()
    }
}

#[async_trait]
impl SearchProvider for LocalIndexProvider {
    fn source(&self) -> PlaceSource {
        PlaceSource::Local
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new().api_key_required(false).location_bias(false)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self), fields(provider = "local"))]
    async fn search(&self, params: &RequestParams) -> Result<Vec<Place>, ProviderError> {
        let text = params.query.trim().to_string();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let index = Arc::clone(&self.inner);
        let limit = params.limit;
        let places = tokio::task::spawn_blocking(move || index.run(&*index.text_query(&text), limit))
            .await
            .map_err(task_error)??;

        debug!("Local index returned {} places for '{}'", places.len(), params.query.trim());
        Ok(places)
    }

    async fn get_place_details(&self, place_id: &str) -> Result<Place, ProviderError> {
        let index = Arc::clone(&self.inner);
        let id = place_id.to_string();
        tokio::task::spawn_blocking(move || index.run(&*index.id_query(&id), 1))
            .await
            .map_err(task_error)??
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(place_id.to_string()))
    }
}

#[async_trait]
impl PersistentProvider for LocalIndexProvider {
    async fn save_place(&self, place: &Place) -> Result<(), ProviderError> {
        let index = Arc::clone(&self.inner);
        let owned = place.clone();
        tokio::task::spawn_blocking(move || index.upsert(&owned))
            .await
            .map_err(task_error)??;

        debug!("Indexed place {}", place.key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::GeoPoint;

    fn cafe(id: &str, name: &str, source: PlaceSource) -> Place {
        Place::new(id, name, source)
            .unwrap()
            .with_address("42 Harbour Road, Portsmouth")
            .with_coordinates(Some(50.8), Some(-1.09))
            .unwrap()
            .with_attribute("rating", 4.5)
    }

    #[tokio::test]
    async fn test_save_then_search() {
        let index = LocalIndexProvider::in_memory().unwrap();
        index.save_place(&cafe("mb-1", "Harbour Coffee", PlaceSource::Mapbox)).await.unwrap();
        index.save_place(&cafe("mb-2", "Dockside Books", PlaceSource::Mapbox)).await.unwrap();

        let results = index.search(&RequestParams::new("coffee", 5)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Harbour Coffee");
        // provenance survives the round trip
        assert_eq!(results[0].source, PlaceSource::Mapbox);
        assert_eq!(results[0].latitude, Some(50.8));
        assert_eq!(results[0].additional_data["rating"], AttributeValue::Number(4.5));

        let by_address = index.search(&RequestParams::new("portsmouth", 5)).await.unwrap();
        assert_eq!(by_address.len(), 2);
    }

    #[tokio::test]
    async fn test_search_respects_limit_and_ignores_location() {
        let index = LocalIndexProvider::in_memory().unwrap();
        for i in 0..4 {
            let place = cafe(&format!("id-{}", i), &format!("Coffee {}", i), PlaceSource::Google);
            index.save_place(&place).await.unwrap();
        }

        let params = RequestParams::new("coffee", 2)
            .with_location(Some(GeoPoint::new(51.5, -0.12).unwrap()));
        let results = index.search(&params).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let index = LocalIndexProvider::in_memory().unwrap();
        let results = index.search(&RequestParams::new("anything", 5)).await.unwrap();
        assert!(results.is_empty());

        let results = index.search(&RequestParams::new("\"unbalanced (", 5)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_by_source_and_id() {
        let index = LocalIndexProvider::in_memory().unwrap();
        index.save_place(&cafe("x", "Old Name", PlaceSource::Mapbox)).await.unwrap();
        index.save_place(&cafe("x", "New Name", PlaceSource::Mapbox)).await.unwrap();
        assert_eq!(index.num_docs(), 1);

        index.save_place(&cafe("x", "Other Vendor", PlaceSource::Google)).await.unwrap();
        assert_eq!(index.num_docs(), 2);

        let mut names: Vec<_> = index
            .search(&RequestParams::new("name vendor", 5))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["New Name", "Other Vendor"]);
    }

    #[tokio::test]
    async fn test_details_by_id() {
        let index = LocalIndexProvider::in_memory().unwrap();
        let place = cafe("poi.123", "Harbour Coffee", PlaceSource::Mapbox);
        index.save_place(&place).await.unwrap();

        let found = index.get_place_details("poi.123").await.unwrap();
        assert_eq!(found, place);

        let err = index.get_place_details("poi.999").await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("poi.999".to_string()));
    }

    #[tokio::test]
    async fn test_place_without_coordinates() {
        let index = LocalIndexProvider::in_memory().unwrap();
        let place = Place::new("g-1", "Nowhere Cafe", PlaceSource::Google).unwrap();
        index.save_place(&place).await.unwrap();

        let found = index.get_place_details("g-1").await.unwrap();
        assert_eq!(found.location(), None);
        assert_eq!(found.address, "");
    }

    #[test]
    fn test_search_yields_to_timeout() {
        // One blocking thread, kept busy, so the index call has to wait for it
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .max_blocking_threads(1)
            .build()
            .unwrap();

        runtime.block_on(async {
            let index = LocalIndexProvider::in_memory().unwrap();
            index.save_place(&cafe("p1", "Harbour Coffee", PlaceSource::Mapbox)).await.unwrap();

            let busy = tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_millis(300)));
            let result = tokio::time::timeout(
                Duration::from_millis(20),
                index.search(&RequestParams::new("coffee", 5)),
            )
            .await;
            assert!(result.is_err(), "search should not complete while the pool is busy");

            busy.await.unwrap();
            let results = index.search(&RequestParams::new("coffee", 5)).await.unwrap();
            assert_eq!(results.len(), 1);
        });
    }

    #[tokio::test]
    async fn test_on_disk_index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = LocalIndexProvider::open(dir.path(), 50_000_000).unwrap();
            index.save_place(&cafe("p1", "Harbour Coffee", PlaceSource::Mapbox)).await.unwrap();
        }

        let index = LocalIndexProvider::open(dir.path(), 50_000_000).unwrap();
        assert_eq!(index.num_docs(), 1);
        assert_eq!(index.get_place_details("p1").await.unwrap().name, "Harbour Coffee");
    }
}
