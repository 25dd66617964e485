use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::chunking::CanonicalChunk;
use crate::util::now_utc_string;

pub struct DocumentRecord<'a> {
    pub doc_id: &'a str,
    pub code: &'a str,
    pub source_path: &'a str,
    pub sha256: &'a str,
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS docs (
              doc_id TEXT PRIMARY KEY,
              code TEXT NOT NULL,
              source_path TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              chunk_count INTEGER NOT NULL DEFAULT 0,
              updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
              doc_id TEXT NOT NULL,
              chunk_index INTEGER NOT NULL,
              chunk_id TEXT NOT NULL,
              code TEXT NOT NULL,
              clause TEXT,
              title TEXT,
              depth INTEGER NOT NULL,
              pages_json TEXT NOT NULL,
              page_first INTEGER,
              page_last INTEGER,
              part TEXT,
              content TEXT NOT NULL,
              char_count INTEGER NOT NULL,
              word_count INTEGER NOT NULL,
              PRIMARY KEY(doc_id, chunk_index),
              FOREIGN KEY(doc_id) REFERENCES docs(doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_chunk_id ON chunks(chunk_id);
            CREATE INDEX IF NOT EXISTS idx_chunks_doc_clause ON chunks(doc_id, clause);
            ",
        )
        .context("failed to create chunk store schema")?;
    Ok(())
}

/// Replaces every stored chunk of one document inside a single transaction.
pub fn replace_document_chunks(
    connection: &mut Connection,
    document: &DocumentRecord<'_>,
    chunks: &[CanonicalChunk],
) -> Result<usize> {
    let tx = connection.transaction()?;

    tx.execute(
        "
        INSERT INTO docs(doc_id, code, source_path, sha256, chunk_count, updated_at)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(doc_id) DO UPDATE SET
          code=excluded.code,
          source_path=excluded.source_path,
          sha256=excluded.sha256,
          chunk_count=excluded.chunk_count,
          updated_at=excluded.updated_at
        ",
        params![
            document.doc_id,
            document.code,
            document.source_path,
            document.sha256,
            chunks.len() as i64,
            now_utc_string()
        ],
    )
    .with_context(|| format!("failed to upsert document {}", document.doc_id))?;

    tx.execute("DELETE FROM chunks WHERE doc_id = ?1", params![document.doc_id])
        .with_context(|| format!("failed to clear chunks for {}", document.doc_id))?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO chunks(
              chunk_id, doc_id, chunk_index, code, clause, title, depth,
              pages_json, page_first, page_last, part, content, char_count, word_count
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
        )?;

        for (index, chunk) in chunks.iter().enumerate() {
            let pages_json = serde_json::to_string(&chunk.pages)
                .with_context(|| format!("failed to encode pages for {}", chunk.id))?;

            statement
                .execute(params![
                    &chunk.id,
                    document.doc_id,
                    index as i64,
                    &chunk.code,
                    &chunk.clause,
                    &chunk.title,
                    chunk.depth,
                    pages_json,
                    chunk.pages.first(),
                    chunk.pages.last(),
                    &chunk.part,
                    &chunk.content,
                    chunk.char_count as i64,
                    chunk.word_count as i64
                ])
                .with_context(|| format!("failed to insert chunk {} ({})", index, chunk.id))?;
        }
    }

    tx.commit()?;
    Ok(chunks.len())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
