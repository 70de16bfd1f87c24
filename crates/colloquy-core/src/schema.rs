use tantivy::schema::{self, Schema, FAST, INDEXED, STORED, STRING, TEXT};

/// Field names used in the chunk index.
pub mod field {
    pub const ID: &str = "id";
    pub const TEXT: &str = "text";
    pub const FILE_NAME: &str = "file_name";
    pub const CONVERSATION_ID: &str = "conversation_id";
    pub const USER_ID: &str = "user_id";
    pub const CREATED_AT_MS: &str = "created_at_ms";
    pub const METADATA: &str = "metadata";
}

/// Build the Tantivy schema for stored RAG chunks.
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    // Identifiers: stored and indexed as exact strings
    builder.add_text_field(field::ID, STRING | STORED);

    // Dedup key components: exact-match filterable
    builder.add_text_field(field::FILE_NAME, STRING | STORED);
    builder.add_text_field(field::CONVERSATION_ID, STRING | STORED);
    builder.add_text_field(field::USER_ID, STRING | STORED);

    // Chunk body: tokenized for BM25 similarity and stored for context assembly
    builder.add_text_field(field::TEXT, TEXT | STORED);

    builder.add_i64_field(field::CREATED_AT_MS, INDEXED | STORED | FAST);

    // Arbitrary metadata map, serialized as JSON
    builder.add_text_field(field::METADATA, STORED);

    builder.build()
}

/// Resolve a field by name from the schema, returning the Tantivy `Field` handle.
///
/// # Panics
///
/// Panics if the field name does not exist in the schema. This is only called
/// with the constants in [`field`], so a panic indicates a schema definition bug.
pub fn get_field(schema: &Schema, name: &str) -> schema::Field {
    schema
        .get_field(name)
        .unwrap_or_else(|_| panic!("field '{name}' not found in schema"))
}
