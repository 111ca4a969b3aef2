//! HTTP API client for the CKAN action API
//!
//! [`CatalogApi`] is the seam the locator, mutator and ingestion monitors are
//! written against; [`CkanClient`] is the `reqwest` implementation.

use crate::api::endpoints::{action_url, actions};
use crate::api::types::*;
use crate::config::Config;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use ckan_common::types::{ActionResponse, Package, Resource, TaskStatus};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Operations the CLI needs from the catalog service
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch a dataset together with its resource list
    async fn package_show(&self, package_id: &str) -> Result<Package>;

    async fn resource_show(&self, resource_id: &str) -> Result<Resource>;

    /// Create a resource with file content (multipart upload)
    async fn resource_create(&self, resource: &NewResource, file: &UploadFile) -> Result<Resource>;

    /// Replace the file content of an existing resource (multipart upload)
    async fn resource_update(&self, resource_id: &str, file: &UploadFile) -> Result<Resource>;

    async fn resource_delete(&self, resource_id: &str) -> Result<()>;

    /// Drop the ingested DataStore table. Returns `false` if there was none.
    async fn datastore_delete(&self, resource_id: &str, force: bool) -> Result<bool>;

    /// Status of a background task, `None` if the server does not know it
    async fn task_status_show(
        &self,
        entity_id: &str,
        task_type: &str,
        key: &str,
    ) -> Result<Option<TaskStatus>>;

    /// Ask the server to run the ingestion job for a resource again
    async fn datapusher_submit(&self, resource_id: &str) -> Result<()>;
}

/// API client for a CKAN instance
pub struct CkanClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CkanClient {
    /// Create a new API client
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(config.api_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.ckan_url().to_string(),
            api_key: api_key.into(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.api_key.as_str())
    }

    async fn get(&self, action: &str, query: &[(&str, &str)]) -> Result<Response> {
        debug!(action, "GET CKAN action");
        let request = self.client.get(action_url(&self.base_url, action)).query(query);
        Ok(self.authorized(request).send().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, action: &str, body: &B) -> Result<Response> {
        debug!(action, "POST CKAN action");
        let request = self.client.post(action_url(&self.base_url, action)).json(body);
        Ok(self.authorized(request).send().await?)
    }

    /// Multipart requests get their content type (with boundary) from reqwest
    async fn post_multipart(&self, action: &str, form: Form) -> Result<Response> {
        debug!(action, "POST CKAN action (multipart)");
        let request = self.client.post(action_url(&self.base_url, action)).multipart(form);
        Ok(self.authorized(request).send().await?)
    }

    /// Stream the file from disk instead of buffering it
    async fn upload_part(file: &UploadFile) -> Result<Part> {
        let reader = tokio::fs::File::open(&file.path).await?;
        let body = Body::wrap_stream(ReaderStream::new(reader));
        Ok(Part::stream_with_length(body, file.size).file_name(file.file_name.clone()))
    }
}

/// Read the body and unwrap the action envelope
async fn decode<T: DeserializeOwned>(action: &str, response: Response) -> Result<T> {
    let envelope: ActionResponse<T> = read_envelope(action, response).await?;
    Ok(envelope.into_result(action)?)
}

/// Like [`decode`] but only checks the success flag
async fn decode_ack(action: &str, response: Response) -> Result<()> {
    let envelope: ActionResponse<serde_json::Value> = read_envelope(action, response).await?;
    Ok(envelope.ensure_success(action)?)
}

async fn read_envelope<T: DeserializeOwned>(
    action: &str,
    response: Response,
) -> Result<ActionResponse<T>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CliError::server(action, status.as_u16(), body));
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl CatalogApi for CkanClient {
    async fn package_show(&self, package_id: &str) -> Result<Package> {
        let response = self.get(actions::PACKAGE_SHOW, &[("id", package_id)]).await?;
        decode(actions::PACKAGE_SHOW, response).await
    }

    async fn resource_show(&self, resource_id: &str) -> Result<Resource> {
        let response = self.get(actions::RESOURCE_SHOW, &[("id", resource_id)]).await?;
        decode(actions::RESOURCE_SHOW, response).await
    }

    async fn resource_create(&self, resource: &NewResource, file: &UploadFile) -> Result<Resource> {
        let form = Form::new()
            .text("package_id", resource.package_id.clone())
            .text("name", resource.name.clone())
            .text("description", resource.description.clone())
            .text("format", resource.format.clone())
            .part("upload", Self::upload_part(file).await?);

        let response = self.post_multipart(actions::RESOURCE_CREATE, form).await?;
        decode(actions::RESOURCE_CREATE, response).await
    }

    async fn resource_update(&self, resource_id: &str, file: &UploadFile) -> Result<Resource> {
        let form = Form::new()
            .text("id", resource_id.to_string())
            .part("upload", Self::upload_part(file).await?);

        let response = self.post_multipart(actions::RESOURCE_UPDATE, form).await?;
        decode(actions::RESOURCE_UPDATE, response).await
    }

    async fn resource_delete(&self, resource_id: &str) -> Result<()> {
        let response = self
            .post_json(actions::RESOURCE_DELETE, &IdRequest { id: resource_id })
            .await?;
        decode_ack(actions::RESOURCE_DELETE, response).await
    }

    async fn datastore_delete(&self, resource_id: &str, force: bool) -> Result<bool> {
        let body = DatastoreDeleteRequest { resource_id, force };
        let response = self.post_json(actions::DATASTORE_DELETE, &body).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(resource_id, "No DataStore table to delete");
            return Ok(false);
        }

        decode_ack(actions::DATASTORE_DELETE, response).await?;
        Ok(true)
    }

    async fn task_status_show(
        &self,
        entity_id: &str,
        task_type: &str,
        key: &str,
    ) -> Result<Option<TaskStatus>> {
        let query = [("entity_id", entity_id), ("task_type", task_type), ("key", key)];
        let response = self.get(actions::TASK_STATUS_SHOW, &query).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        decode(actions::TASK_STATUS_SHOW, response).await.map(Some)
    }

    async fn datapusher_submit(&self, resource_id: &str) -> Result<()> {
        let response = self
            .post_json(actions::DATAPUSHER_SUBMIT, &DatapusherSubmitRequest { resource_id })
            .await?;
        decode_ack(actions::DATAPUSHER_SUBMIT, response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client_for(server: &MockServer) -> CkanClient {
        let config = Config::new(server.uri()).unwrap();
        CkanClient::new(&config, "secret-key").unwrap()
    }

    async fn data_file(dir: &tempfile::TempDir) -> UploadFile {
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();
        UploadFile::open(&path).await.unwrap()
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true, "result": result}))
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/resource_show"))
            .respond_with(ok(serde_json::json!({"id": "r1"})))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config::new(format!("{}/", server.uri())).unwrap();
        let client = CkanClient::new(&config, "key").unwrap();
        assert_eq!(client.resource_show("r1").await.unwrap().id, "r1");
    }

    #[tokio::test]
    async fn test_envelope_without_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/package_show"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .mount(&server)
            .await;

        let err = client_for(&server).package_show("city-budget").await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Action(ckan_common::CommonError::MissingResult { ref action }) if action == "package_show"
        ));
    }

    #[tokio::test]
    async fn test_package_show_sends_credential_and_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/package_show"))
            .and(query_param("id", "city-budget"))
            .and(header("authorization", "secret-key"))
            .respond_with(ok(serde_json::json!({
                "id": "pkg-1",
                "resources": [{"id": "r1", "name": "2024"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let package = client_for(&server).package_show("city-budget").await.unwrap();
        assert_eq!(package.id, "pkg-1");
        assert_eq!(package.resources[0].id, "r1");
    }

    #[tokio::test]
    async fn test_server_error_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/package_show"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"success": false, "error": {"message": "Access denied"}}"#,
            ))
            .mount(&server)
            .await;

        let err = client_for(&server).package_show("private").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.server_body().unwrap().contains("Access denied"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/resource_show"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).resource_show("r1").await.unwrap_err();
        assert!(matches!(err, CliError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_resource_create_is_multipart() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/resource_create"))
            .and(header("authorization", "secret-key"))
            .and(body_string_contains("name=\"upload\"; filename=\"data.csv\""))
            .and(body_string_contains("Data uploaded via script"))
            .and(body_string_contains("CSV"))
            .respond_with(ok(serde_json::json!({"id": "new-id", "name": "population"})))
            .expect(1)
            .mount(&server)
            .await;

        let resource = NewResource::new("pkg", "population", "Data uploaded via script");
        let dir = tempfile::tempdir().unwrap();
        let file = data_file(&dir).await;
        let created = client_for(&server).resource_create(&resource, &file).await.unwrap();
        assert_eq!(created.id, "new-id");

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[tokio::test]
    async fn test_resource_update_sends_id_and_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/resource_update"))
            .and(body_string_contains("name=\"id\""))
            .and(body_string_contains("existing-id"))
            .and(body_string_contains("1,2"))
            .respond_with(ok(serde_json::json!({"id": "existing-id"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = data_file(&dir).await;
        let updated = client_for(&server).resource_update("existing-id", &file).await.unwrap();
        assert_eq!(updated.id, "existing-id");
    }

    #[tokio::test]
    async fn test_upload_streams_whole_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/resource_update"))
            .respond_with(ok(serde_json::json!({"id": "big"})))
            .expect(1)
            .mount(&server)
            .await;

        // Several read chunks worth of content
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.csv");
        let content = format!("{}END-OF-FILE\n", "2024,Oslo,700000\n".repeat(20_000));
        std::fs::write(&path, &content).unwrap();
        let file = UploadFile::open(&path).await.unwrap();
        assert_eq!(file.size, content.len() as u64);

        client_for(&server).resource_update("big", &file).await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains(&content));
        assert!(body.contains("filename=\"big.csv\""));
    }

    #[tokio::test]
    async fn test_upload_fails_if_file_vanishes() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let file = data_file(&dir).await;
        std::fs::remove_file(&file.path).unwrap();

        let err = client_for(&server).resource_update("existing-id", &file).await.unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resource_delete_sends_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/resource_delete"))
            .and(header("content-type", "application/json"))
            .and(header_exists("authorization"))
            .and(body_json(serde_json::json!({"id": "r1"})))
            .respond_with(ok(serde_json::Value::Null))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).resource_delete("r1").await.unwrap();
    }

    #[tokio::test]
    async fn test_datastore_delete_tolerates_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/datastore_delete"))
            .and(body_json(serde_json::json!({"resource_id": "r1", "force": true})))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": {"__type": "Not Found Error", "message": "Resource not found"}
            })))
            .mount(&server)
            .await;

        let deleted = client_for(&server).datastore_delete("r1", true).await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_datastore_delete_other_errors_propagate() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/datastore_delete"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).datastore_delete("r1", true).await.unwrap_err();
        assert_eq!(err.server_body(), Some("boom"));
    }

    #[tokio::test]
    async fn test_task_status_show() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/task_status_show"))
            .and(query_param("entity_id", "r1"))
            .and(query_param("task_type", "datapusher"))
            .and(query_param("key", "datapusher"))
            .respond_with(ok(serde_json::json!({"state": "running", "error": "{}"})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/3/action/task_status_show"))
            .and(query_param("entity_id", "gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let task = client
            .task_status_show("r1", "datapusher", "datapusher")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.state, "running");

        let missing = client
            .task_status_show("gone", "datapusher", "datapusher")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_datapusher_submit() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/datapusher_submit"))
            .and(body_json(serde_json::json!({"resource_id": "r1"})))
            .respond_with(ok(serde_json::json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).datapusher_submit("r1").await.unwrap();
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/3/action/datapusher_submit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": {"message": "DataPusher is not configured"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).datapusher_submit("r1").await.unwrap_err();
        assert!(matches!(err, CliError::Action(_)));
        assert!(err.to_string().contains("DataPusher is not configured"));
    }
}
