//! Google Books volumes API

use super::{BookMetadata, LookupGateway};
use crate::config::LookupConfig;
use crate::error::{CoverError, LookupError};
use async_trait::async_trait;
use serde::Deserialize;

/// Response body of a volumes search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    authors: Vec<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

/// Lookup gateway backed by the Google Books API
pub struct GoogleBooksGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleBooksGateway {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn query_url(&self, isbn: &str) -> String {
        format!("{}?q=isbn:{}", self.endpoint, urlencoding::encode(isbn))
    }
}

/// Pick the first matching volume out of a search response
fn parse_volumes(isbn: &str, body: &[u8]) -> Result<BookMetadata, LookupError> {
    let response: VolumesResponse = serde_json::from_slice(body)
        .map_err(|e| LookupError::Transport(format!("malformed lookup response: {}", e)))?;

    let volume = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::NotFound(isbn.to_string()))?;

    let info = volume.volume_info;
    let cover_ref = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail));

    Ok(BookMetadata {
        title: info.title,
        authors: info.authors,
        publisher: info.publisher,
        cover_ref,
    })
}

#[async_trait]
impl LookupGateway for GoogleBooksGateway {
    async fn lookup(&self, isbn: &str) -> Result<BookMetadata, LookupError> {
        let url = self.query_url(isbn);
        tracing::debug!(%url, "querying volumes");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Transport(format!(
                "lookup answered with status {}",
                status
            )));
        }
        let body = response.bytes().await?;
        parse_volumes(isbn, &body)
    }

    async fn fetch_cover(&self, reference: &str) -> Result<Vec<u8>, CoverError> {
        let response = self.client.get(reference).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoverError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_item() {
        let body = br#"{
            "kind": "books#volumes",
            "totalItems": 1,
            "items": [{
                "volumeInfo": {
                    "title": "The C Programming Language",
                    "authors": ["Brian Kernighan", "Dennis Ritchie"],
                    "publisher": "Prentice Hall",
                    "imageLinks": {
                        "smallThumbnail": "http://books.example/s.jpg",
                        "thumbnail": "http://books.example/t.jpg"
                    }
                }
            }]
        }"#;

        let metadata = parse_volumes("9780134190440", body).unwrap();
        assert_eq!(metadata.title, "The C Programming Language");
        assert_eq!(metadata.joined_authors(), "Brian Kernighan,Dennis Ritchie");
        assert_eq!(metadata.publisher, "Prentice Hall");
        assert_eq!(
            metadata.cover_ref.as_deref(),
            Some("http://books.example/t.jpg")
        );
    }

    #[test]
    fn test_no_items_is_not_found() {
        let body = br#"{"kind": "books#volumes", "totalItems": 0}"#;
        assert!(matches!(
            parse_volumes("0000000000000", body),
            Err(LookupError::NotFound(ref isbn)) if isbn == "0000000000000"
        ));

        let body = br#"{"totalItems": 0, "items": []}"#;
        assert!(matches!(
            parse_volumes("0000000000000", body),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_sparse_volume_info() {
        let body = br#"{"items": [{"volumeInfo": {"title": "Untitled Zine"}}]}"#;
        let metadata = parse_volumes("1", body).unwrap();
        assert_eq!(metadata.title, "Untitled Zine");
        assert!(metadata.authors.is_empty());
        assert!(metadata.publisher.is_empty());
        assert!(metadata.cover_ref.is_none());
    }

    #[test]
    fn test_garbage_is_transport_error() {
        assert!(matches!(
            parse_volumes("1", b"<html>rate limited</html>"),
            Err(LookupError::Transport(_))
        ));
    }

    #[test]
    fn test_query_url_encodes_isbn() {
        let gateway = GoogleBooksGateway::new(&LookupConfig::default()).unwrap();
        assert_eq!(
            gateway.query_url("978 0"),
            "https://www.googleapis.com/books/v1/volumes?q=isbn:978%200"
        );
    }
}
