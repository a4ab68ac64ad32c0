//! NCBI E-utilities client.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{ArticleRecord, LiteratureQuery, LiteratureSource, SourceConfig, SourceError};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::parse::parse_article_set;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Identifiers per `efetch` request.
pub const FETCH_BATCH_SIZE: usize = 200;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Searches PubMed with `esearch`, then fetches full records with `efetch`.
#[derive(Debug, Clone)]
pub struct PubMedClient {
    http: Client,
    base_url: String,
    tool: String,
    email: String,
}

impl PubMedClient {
    pub fn new(source: &SourceConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            tool: source.tool.clone(),
            email: source.email.clone(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, SourceError> {
        let response = self
            .http
            .get(format!("{}/{endpoint}", self.base_url))
            .query(params)
            .query(&[("tool", self.tool.as_str()), ("email", self.email.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint, "E-utilities request failed");
                SourceError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, endpoint, "E-utilities error");
            return Err(SourceError::Api(format!("{endpoint} returned {status}: {body}")));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }

    /// Identifiers matching `query`, in relevance order.
    pub async fn search_ids(&self, query: &LiteratureQuery) -> Result<Vec<String>, SourceError> {
        let params = [
            ("db", "pubmed".to_string()),
            ("term", query.term().to_string()),
            ("retmax", query.max_results.to_string()),
            ("reldate", query.recency_days.to_string()),
            ("datetype", "edat".to_string()),
            ("retmode", "json".to_string()),
        ];
        let body = self.get_text("esearch.fcgi", &params).await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(parsed.esearchresult.idlist)
    }

    /// Full records for `ids`, fetched [`FETCH_BATCH_SIZE`] at a time.
    pub async fn fetch(&self, ids: &[String]) -> Result<Vec<ArticleRecord>, SourceError> {
        let mut records = Vec::with_capacity(ids.len());
        for batch in ids.chunks(FETCH_BATCH_SIZE) {
            let params = [
                ("db", "pubmed".to_string()),
                ("id", batch.join(",")),
                ("retmode", "xml".to_string()),
            ];
            let xml = self.get_text("efetch.fcgi", &params).await?;
            let parsed = parse_article_set(&xml)?;
            debug!(requested = batch.len(), parsed = parsed.len(), "Fetched batch");
            records.extend(parsed);
        }
        Ok(records)
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn search(&self, query: &LiteratureQuery) -> Result<Vec<ArticleRecord>, SourceError> {
        let ids = self.search_ids(query).await?;
        info!(query = %query, matches = ids.len(), "PubMed search complete");
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch(&ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE_XML: &str = r#"<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>111</PMID>
      <Article>
        <Journal><Title>JAMA</Title></Journal>
        <ArticleTitle>A trial.</ArticleTitle>
        <Abstract><AbstractText>Short.</AbstractText></Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    fn client(server: &MockServer) -> PubMedClient {
        PubMedClient::new(&SourceConfig::default())
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn search_then_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("term", "\"JAMA\"[journal]"))
            .and(query_param("reldate", "7"))
            .and(query_param("datetype", "edat"))
            .and(query_param("tool", "journal-watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"header":{},"esearchresult":{"count":"1","idlist":["111"]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", "111"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_XML))
            .expect(1)
            .mount(&server)
            .await;

        let query = LiteratureQuery::compose(&["JAMA"], None, 1000, 7).unwrap();
        let records = client(&server).search(&query).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_str(), "111");
        assert_eq!(records[0].journal, "JAMA");
    }

    #[tokio::test]
    async fn no_matches_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"esearchresult":{"count":"0","idlist":[]}}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let query = LiteratureQuery::new("asthma", 10, 7).unwrap();
        assert!(client(&server).search(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_fetched_in_batches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_XML))
            .expect(2)
            .mount(&server)
            .await;

        let ids: Vec<String> = (0..FETCH_BATCH_SIZE + 1).map(|i| i.to_string()).collect();
        let records = client(&server).fetch(&ids).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn server_error_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let query = LiteratureQuery::new("asthma", 10, 7).unwrap();
        let err = client(&server).search(&query).await.unwrap_err();
        assert!(matches!(err, SourceError::Api(_)));
    }
}
