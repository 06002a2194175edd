use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    domain::{Document, DocumentId, Role, User, UserId},
    protocol::{
        AuthResponse, CreateDocumentRequest, CreateRoleRequest, DocumentEnvelope,
        DocumentsEnvelope, LoginRequest, MessageEnvelope, RoleEnvelope, RolesEnvelope,
        SignupRequest, UpdateDocumentRequest, UpdateUserRequest, UserEnvelope, UsersEnvelope,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// Typed HTTP access to the document server. Clones share the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(server_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "api/v1/users")?.json(req))
            .await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "api/v1/users/login")?.json(req))
            .await
    }

    /// Only the status matters; the confirmation body may be absent.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::POST, "api/v1/users/logout")?)
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let envelope: UsersEnvelope = self.send(self.request(Method::GET, "api/v1/users/")?).await?;
        Ok(envelope.users)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ClientError> {
        let path = format!("api/v1/users/{}", user_id.0);
        let envelope: UserEnvelope = self.send(self.request(Method::GET, &path)?).await?;
        Ok(envelope.user)
    }

    pub async fn update_user(
        &self,
        user_id: UserId,
        req: &UpdateUserRequest,
    ) -> Result<User, ClientError> {
        let path = format!("api/v1/users/{}", user_id.0);
        let envelope: UserEnvelope = self
            .send(self.request(Method::PUT, &path)?.json(req))
            .await?;
        Ok(envelope.user)
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<MessageEnvelope, ClientError> {
        let path = format!("api/v1/users/{}", user_id.0);
        self.send(self.request(Method::DELETE, &path)?).await
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ClientError> {
        let envelope: RolesEnvelope = self.send(self.request(Method::GET, "api/v1/roles/")?).await?;
        Ok(envelope.roles)
    }

    pub async fn create_role(&self, req: &CreateRoleRequest) -> Result<Role, ClientError> {
        let envelope: RoleEnvelope = self
            .send(self.request(Method::POST, "api/v1/roles/")?.json(req))
            .await?;
        Ok(envelope.role)
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, ClientError> {
        let envelope: DocumentsEnvelope = self
            .send(self.request(Method::GET, "api/v1/documents/")?)
            .await?;
        Ok(envelope.documents)
    }

    pub async fn get_document(&self, document_id: DocumentId) -> Result<Document, ClientError> {
        let path = format!("api/v1/documents/{}", document_id.0);
        let envelope: DocumentEnvelope = self.send(self.request(Method::GET, &path)?).await?;
        Ok(envelope.document)
    }

    pub async fn create_document(
        &self,
        req: &CreateDocumentRequest,
    ) -> Result<Document, ClientError> {
        let envelope: DocumentEnvelope = self
            .send(self.request(Method::POST, "api/v1/documents/")?.json(req))
            .await?;
        Ok(envelope.document)
    }

    pub async fn update_document(
        &self,
        document_id: DocumentId,
        req: &UpdateDocumentRequest,
    ) -> Result<Document, ClientError> {
        let path = format!("api/v1/documents/{}", document_id.0);
        let envelope: DocumentEnvelope = self
            .send(self.request(Method::PUT, &path)?.json(req))
            .await?;
        Ok(envelope.document)
    }

    pub async fn delete_document(
        &self,
        document_id: DocumentId,
    ) -> Result<MessageEnvelope, ClientError> {
        let path = format!("api/v1/documents/{}", document_id.0);
        self.send(self.request(Method::DELETE, &path)?).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        Ok(match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Turns a non-success response into [`ClientError::Api`], preferring the
/// body's `message` and falling back to the raw body or the status text.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.message)
        .ok()
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/api_client_tests.rs"]
mod tests;
