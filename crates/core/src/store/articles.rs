//! Mirror-table operations for saved article records.
//!
//! The mirror is a best-effort read cache of the remote service's most recent
//! records; the remote side always wins when reachable. Rows are only written
//! here by a bulk upsert after a successful remote read.

use super::connection::LocalStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A saved piece of web content, mirrored from the remote data service.
///
/// `id` matches the remote record's primary key and is unique within the
/// mirror. Timestamps are RFC 3339 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub site_name: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub image_url: Option<String>,
}

fn article_from_row(row: &rusqlite::Row<'_>) -> Result<Article, rusqlite::Error> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        excerpt: row.get(3)?,
        site_name: row.get(4)?,
        author: row.get(5)?,
        published_at: row.get(6)?,
        image_url: row.get(7)?,
    })
}

impl LocalStore {
    /// Return the full current mirror snapshot, most recent first.
    ///
    /// No pagination: the mirror only ever holds the bounded window the last
    /// successful remote read wrote into it.
    pub async fn list_articles(&self) -> Result<Vec<Article>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Article>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, title, content, excerpt, site_name, author, published_at, image_url
                     FROM articles
                     ORDER BY published_at DESC, id",
                )?;

                let rows = stmt.query_map([], article_from_row)?;
                let mut articles = Vec::new();
                for row in rows {
                    articles.push(row?);
                }
                Ok(articles)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a single mirrored record by its remote identifier.
    pub async fn get_article(&self, id: &str) -> Result<Option<Article>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Article>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, title, content, excerpt, site_name, author, published_at, image_url
                     FROM articles WHERE id = ?1",
                )?;

                let result = stmt.query_row(params![id], article_from_row);

                match result {
                    Ok(article) => Ok(Some(article)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Bulk-upsert the given records into the mirror.
    ///
    /// Idempotent: each record is written under its id, overwriting any
    /// existing row with the same id. Rows absent from the incoming set are
    /// left in place. All writes commit as one transaction, so readers see
    /// the change all-or-nothing.
    pub async fn replace_articles(&self, articles: &[Article]) -> Result<(), Error> {
        let articles = articles.to_vec();
        let mirrored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO articles (
                            id, title, content, excerpt, site_name,
                            author, published_at, image_url, mirrored_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        ON CONFLICT(id) DO UPDATE SET
                            title = excluded.title,
                            content = excluded.content,
                            excerpt = excluded.excerpt,
                            site_name = excluded.site_name,
                            author = excluded.author,
                            published_at = excluded.published_at,
                            image_url = excluded.image_url,
                            mirrored_at = excluded.mirrored_at",
                    )?;
                    for article in &articles {
                        stmt.execute(params![
                            &article.id,
                            &article.title,
                            &article.content,
                            &article.excerpt,
                            &article.site_name,
                            &article.author,
                            &article.published_at,
                            &article.image_url,
                            &mirrored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
