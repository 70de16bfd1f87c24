use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::info;
use uuid::Uuid;

use colloquy_core::models::chunk::{DedupKey, RagChunk};
use colloquy_core::schema::{build_schema, field, get_field};

use super::{ChunkStore, ScoredChunk, SearchQuery, query_terms};
use crate::error::StoreError;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Chunk store backed by a Tantivy index; similarity is BM25 over chunk text.
///
/// The index lives in RAM or in a directory. All index work runs on the
/// blocking pool. The writer mutex serializes the dedup check with the
/// insert and commit, and the reader is reloaded before the lock is released,
/// so a later check always sees earlier inserts.
#[derive(Clone)]
pub struct TantivyStore {
    inner: Arc<Inner>,
}

struct Inner {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: Fields,
}

#[derive(Clone, Copy)]
struct Fields {
    id: Field,
    text: Field,
    file_name: Field,
    conversation_id: Field,
    user_id: Field,
    created_at_ms: Field,
    metadata: Field,
}

impl TantivyStore {
    /// A store whose index lives only in memory.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_index(Index::create_in_ram(build_schema()))
    }

    /// Open the index in `dir`, creating it if the directory holds none.
    pub fn open_or_create(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let directory =
            MmapDirectory::open(dir).map_err(|e| StoreError::OpenDirectory(e.to_string()))?;
        let index = Index::open_or_create(directory, build_schema())?;
        info!(dir = %dir.display(), "opened chunk index");
        Self::from_index(index)
    }

    fn from_index(index: Index) -> Result<Self, StoreError> {
        let schema = index.schema();
        let fields = Fields {
            id: get_field(&schema, field::ID),
            text: get_field(&schema, field::TEXT),
            file_name: get_field(&schema, field::FILE_NAME),
            conversation_id: get_field(&schema, field::CONVERSATION_ID),
            user_id: get_field(&schema, field::USER_ID),
            created_at_ms: get_field(&schema, field::CREATED_AT_MS),
            metadata: get_field(&schema, field::METADATA),
        };

        let writer: IndexWriter = index.writer(WRITER_HEAP_BYTES)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            inner: Arc::new(Inner {
                index,
                reader,
                writer: Mutex::new(writer),
                fields,
            }),
        })
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

impl Inner {
    fn key_query(&self, key: &DedupKey) -> BooleanQuery {
        let file = TermQuery::new(
            Term::from_field_text(self.fields.file_name, &key.file_name),
            IndexRecordOption::Basic,
        );
        let conversation = TermQuery::new(
            Term::from_field_text(self.fields.conversation_id, &key.conversation_id),
            IndexRecordOption::Basic,
        );
        BooleanQuery::new(vec![
            (Occur::Must, Box::new(file) as Box<dyn Query>),
            (Occur::Must, Box::new(conversation) as Box<dyn Query>),
        ])
    }

    fn contains(&self, key: &DedupKey) -> Result<bool, StoreError> {
        let searcher = self.reader.searcher();
        Ok(searcher.search(&self.key_query(key), &Count)? > 0)
    }

    fn to_document(&self, chunk: &RagChunk) -> Result<TantivyDocument, StoreError> {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.fields.id, chunk.id.to_string());
        doc.add_text(self.fields.text, &chunk.text);
        doc.add_text(self.fields.file_name, &chunk.source_file_name);
        doc.add_text(self.fields.conversation_id, &chunk.conversation_id);
        if let Some(user_id) = &chunk.user_id {
            doc.add_text(self.fields.user_id, user_id);
        }
        doc.add_i64(self.fields.created_at_ms, chunk.created_at_ms);
        doc.add_text(self.fields.metadata, serde_json::to_string(&chunk.metadata)?);
        Ok(doc)
    }

    fn from_document(&self, doc: &TantivyDocument) -> Result<RagChunk, StoreError> {
        let text_of = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let raw_id = text_of(self.fields.id).unwrap_or_default();
        let id = Uuid::parse_str(&raw_id).map_err(|e| StoreError::CorruptChunk {
            id: raw_id.clone(),
            reason: e.to_string(),
        })?;

        let metadata: BTreeMap<String, String> = match text_of(self.fields.metadata) {
            Some(json) => serde_json::from_str(&json)?,
            None => BTreeMap::new(),
        };

        Ok(RagChunk {
            id,
            text: text_of(self.fields.text).unwrap_or_default(),
            source_file_name: text_of(self.fields.file_name).unwrap_or_default(),
            conversation_id: text_of(self.fields.conversation_id).unwrap_or_default(),
            user_id: text_of(self.fields.user_id),
            created_at_ms: doc
                .get_first(self.fields.created_at_ms)
                .and_then(|v| v.as_i64())
                .unwrap_or_default(),
            metadata,
        })
    }
}

#[async_trait]
impl ChunkStore for TantivyStore {
    async fn insert_if_absent(&self, key: &DedupKey, chunks: Vec<RagChunk>) -> Result<bool, StoreError> {
        let key = key.clone();
        self.run_blocking(move |inner| {
            let mut writer = inner.writer.lock().map_err(|_| StoreError::Poisoned)?;

            if inner.contains(&key)? {
                return Ok(false);
            }

            let written = chunks
                .iter()
                .try_for_each(|chunk| {
                    writer.add_document(inner.to_document(chunk)?)?;
                    Ok::<_, StoreError>(())
                })
                .and_then(|()| writer.commit().map(drop).map_err(StoreError::from));

            // All-or-nothing: nothing buffered by a failed batch may reach a later commit.
            if let Err(e) = written {
                writer.rollback()?;
                return Err(e);
            }
            inner.reader.reload()?;

            info!(
                file_name = %key.file_name,
                conversation_id = %key.conversation_id,
                count = chunks.len(),
                "indexed chunks"
            );
            Ok(true)
        })
        .await
    }

    async fn similarity_search(&self, query: &SearchQuery) -> Result<Vec<ScoredChunk>, StoreError> {
        let terms = query_terms(&query.text);
        if terms.is_empty() || query.top_k == 0 {
            return Ok(Vec::new());
        }
        let query = query.clone();

        self.run_blocking(move |inner| {
            let searcher = inner.reader.searcher();

            let parser = QueryParser::for_index(&inner.index, vec![inner.fields.text]);
            let text_query = parser
                .parse_query(&terms.join(" "))
                .map_err(|e| StoreError::QueryParse(e.to_string()))?;

            let full_query: Box<dyn Query> = match &query.conversation_id {
                Some(conversation_id) => Box::new(BooleanQuery::new(vec![
                    (Occur::Must, text_query),
                    (
                        Occur::Must,
                        Box::new(TermQuery::new(
                            Term::from_field_text(inner.fields.conversation_id, conversation_id),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>,
                    ),
                ])),
                None => text_query,
            };

            let top_docs = searcher.search(&full_query, &TopDocs::with_limit(query.top_k))?;

            let mut hits = Vec::with_capacity(top_docs.len());
            for (score, doc_address) in top_docs {
                let doc = searcher.doc::<TantivyDocument>(doc_address)?;
                hits.push(ScoredChunk {
                    chunk: inner.from_document(&doc)?,
                    score,
                });
            }
            Ok(hits)
        })
        .await
    }

    async fn len(&self) -> Result<usize, StoreError> {
        self.run_blocking(|inner| Ok(inner.reader.searcher().num_docs() as usize))
            .await
    }
}
