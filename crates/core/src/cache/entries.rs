//! Cache entry operations over generations.
//!
//! A generation is a named snapshot of the cache store; entries are keyed
//! by (generation, request key). Rotation happens by writing into a new
//! generation and deleting every other one at activation.

use super::connection::CacheDb;
use crate::error::Error;
use crate::request::Request;
use crate::response::{Response, ResponseKind};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot as it sits in the database.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: String,
    pub generation: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub kind: String,
    pub headers_json: String,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl Entry {
    /// Restore the stored snapshot into a servable response.
    pub fn into_response(self) -> Result<Response, Error> {
        let kind: ResponseKind = self.kind.parse().map_err(Error::CorruptEntry)?;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Response { status: self.status, kind, headers, body: Bytes::from(self.body) })
    }
}

impl CacheDb {
    /// Store a response snapshot under the request's key in a generation.
    ///
    /// Uses UPSERT semantics: a re-fetch of the same request replaces the
    /// previous snapshot.
    pub async fn put_entry(&self, generation: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let generation = generation.to_string();
        let key = request.cache_key();
        let method = request.method.as_str().to_string();
        let url = request.url.to_string();
        let status = response.status;
        let kind = response.kind.as_str().to_string();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        generation, key, method, url, status, kind, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(generation, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        kind = excluded.kind,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![generation, key, method, url, status, kind, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by generation and request key.
    ///
    /// Returns None if the key is not present in that generation.
    pub async fn get_entry(&self, generation: &str, key: &str) -> Result<Option<Entry>, Error> {
        let generation = generation.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Entry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT generation, key, method, url, status, kind, headers_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![generation, key], |row| {
                    Ok(Entry {
                        generation: row.get(0)?,
                        key: row.get(1)?,
                        method: row.get(2)?,
                        url: row.get(3)?,
                        status: row.get(4)?,
                        kind: row.get(5)?,
                        headers_json: row.get(6)?,
                        body: row.get(7)?,
                        stored_at: row.get(8)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request in a generation's store.
    pub async fn match_request(&self, generation: &str, request: &Request) -> Result<Option<Entry>, Error> {
        self.get_entry(generation, &request.cache_key()).await
    }

    /// All generation names currently holding entries, sorted.
    pub async fn generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT generation FROM entries ORDER BY generation")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry in a generation.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_generation(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM entries WHERE generation = ?1", params![generation])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a generation.
    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE generation = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn make_request(path: &str) -> Request {
        Request::get(Url::parse("https://ksvisual.example").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = make_request("/about.html");
        let response = Response::basic("<html>about</html>").with_header("Content-Type", "text/html");

        db.put_entry("v1", &request, &response).await.unwrap();

        let entry = db.match_request("v1", &request).await.unwrap().unwrap();
        assert_eq!(entry.url, "https://ksvisual.example/about.html");

        let restored = entry.into_response().unwrap();
        assert_eq!(restored.status, 200);
        assert_eq!(restored.content_type(), Some("text/html"));
        assert_eq!(restored.body, Bytes::from("<html>about</html>"));
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = db.match_request("v1", &make_request("/missing.html")).await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_generations_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = make_request("/index.html");
        db.put_entry("v1", &request, &Response::basic("old")).await.unwrap();
        db.put_entry("v2", &request, &Response::basic("new")).await.unwrap();

        let old = db.match_request("v1", &request).await.unwrap().unwrap();
        let new = db.match_request("v2", &request).await.unwrap().unwrap();
        assert_eq!(old.into_response().unwrap().body, Bytes::from("old"));
        assert_eq!(new.into_response().unwrap().body, Bytes::from("new"));
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = make_request("/data.json");
        db.put_entry("v1", &request, &Response::basic("{\"a\":1}")).await.unwrap();
        db.put_entry("v1", &request, &Response::basic("{\"a\":2}")).await.unwrap();

        assert_eq!(db.entry_count("v1").await.unwrap(), 1);
        let entry = db.match_request("v1", &request).await.unwrap().unwrap();
        assert_eq!(entry.into_response().unwrap().body, Bytes::from("{\"a\":2}"));
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &make_request("/a"), &Response::basic("a")).await.unwrap();
        db.put_entry("v1", &make_request("/b"), &Response::basic("b")).await.unwrap();
        db.put_entry("v2", &make_request("/a"), &Response::basic("a2")).await.unwrap();

        let deleted = db.delete_generation("v1").await.unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(db.generations().await.unwrap(), vec!["v2".to_string()]);
        assert_eq!(db.entry_count("v2").await.unwrap(), 1);
    }
}
