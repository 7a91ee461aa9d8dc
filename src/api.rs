use crate::models::{DashboardStats, Page, ServiceOrder};
use crate::storage::{Storage, StorageError, TOKEN_KEY, USER_KEY};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub(crate) use reqwest::Method;

/// The one route that may answer 401 without meaning "your session expired"
pub(crate) const LOGIN_PATH: &str = "/api/auth/login";

/// Collections exposing the usual list/get/create/update/delete routes
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Resource {
    Clients,
    Products,
    Services,
    Users,
    ServiceOrders,
}

impl Resource {
    pub(crate) fn path(self) -> &'static str {
        match self {
            Resource::Clients => "/api/clientes",
            Resource::Products => "/api/produtos",
            Resource::Services => "/api/servicos",
            Resource::Users => "/api/usuarios",
            Resource::ServiceOrders => "/api/ordens-servico",
        }
    }

    pub(crate) fn item_path(self, id: i64) -> String {
        format!("{}/{id}", self.path())
    }
}

/// Blocking client for the backend's REST API.
///
/// Every request carries the bearer token currently held in storage, read at
/// the moment the request is built, so logging in or out never has to touch
/// the client itself.
#[derive(Debug)]
pub(crate) struct ApiClient<S> {
    base_url: String,
    http: Client,
    storage: S,
}

impl<S: Storage> ApiClient<S> {
    pub(crate) fn new(base_url: &str, storage: S) -> Result<ApiClient<S>, ApiError> {
        let http = Client::builder().build().map_err(ApiError::Network)?;
        Ok(ApiClient {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
            storage,
        })
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    /// Sends a request to `path` (relative to the base URL) with an optional
    /// JSON body, returning the response if its status indicates success.
    ///
    /// A 401 from anywhere but the login route means the stored token is no
    /// longer good, so the stored token and user are removed before
    /// [`ApiError::Unauthorized`] is returned.
    pub(crate) fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let mut req = self
            .http
            .request(method.clone(), format!("{}{path}", self.base_url))
            .header(ACCEPT, "application/json");
        if let Some(token) = self.storage.get(TOKEN_KEY)? {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().map_err(ApiError::Network)?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "API request completed");
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            if path != LOGIN_PATH {
                warn!(path, "server rejected credentials; clearing stored session");
                self.storage.remove(TOKEN_KEY)?;
                self.storage.remove(USER_KEY)?;
            }
            return Err(ApiError::Unauthorized);
        }
        let message = response
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty());
        Err(ApiError::Status { status, message })
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None::<&()>)?
            .json()
            .map_err(ApiError::Decode)
    }

    pub(crate) fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(method, path, Some(body))?
            .json()
            .map_err(ApiError::Decode)
    }

    pub(crate) fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = self
            .request(Method::GET, path, None::<&()>)?
            .bytes()
            .map_err(ApiError::Decode)?;
        Ok(bytes.to_vec())
    }

    pub(crate) fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ApiError> {
        self.get_json(resource.path())
    }

    pub(crate) fn fetch<T: DeserializeOwned>(&self, resource: Resource, id: i64) -> Result<T, ApiError> {
        self.get_json(&resource.item_path(id))
    }

    pub(crate) fn create<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        resource: Resource,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::POST, resource.path(), body)
    }

    pub(crate) fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: i64,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::PUT, &resource.item_path(id), body)
    }

    pub(crate) fn delete(&self, resource: Resource, id: i64) -> Result<(), ApiError> {
        self.request(Method::DELETE, &resource.item_path(id), None::<&()>)?;
        Ok(())
    }

    /// Fetches one page (zero-based) of service orders
    pub(crate) fn service_orders_page(&self, page: u32) -> Result<Page<ServiceOrder>, ApiError> {
        self.get_json(&format!("{}?page={page}", Resource::ServiceOrders.path()))
    }

    /// Fetches every page of service orders
    pub(crate) fn all_service_orders(&self) -> Result<Vec<ServiceOrder>, ApiError> {
        let mut orders = Vec::new();
        let mut page_no = 0;
        loop {
            let page = self.service_orders_page(page_no)?;
            let empty = page.content.is_empty();
            orders.extend(page.content);
            page_no += 1;
            if empty || page_no >= page.total_pages {
                break;
            }
        }
        Ok(orders)
    }

    pub(crate) fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("/api/dashboard/stats")
    }

    /// Downloads the printable PDF rendering of a service order
    pub(crate) fn service_order_pdf(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&format!("/api/pdf/ordem-servico/{id}"))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("could not reach the server")]
    Network(#[source] reqwest::Error),
    #[error("not logged in or session expired")]
    Unauthorized,
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("could not decode the server's response")]
    Decode(#[source] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client as ClientRecord, ClientInput, Product};
    use crate::storage::MemoryStorage;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn logged_in(server: &Server) -> ApiClient<MemoryStorage> {
        let storage = MemoryStorage::default();
        storage.set(TOKEN_KEY, "tok123").unwrap();
        storage.set(USER_KEY, r#"{"id":1,"nome":"Admin","email":"a@b.c","tipo":"ADMIN"}"#).unwrap();
        ApiClient::new(&server.url(), storage).unwrap()
    }

    #[test]
    fn test_bearer_token_is_attached() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/produtos")
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "nome": "Cabo HDMI", "preco": 25.0, "quantidadeEstoque": 3}]"#)
            .create();
        let client = logged_in(&server);
        let products: Vec<Product> = client.list(Resource::Products).unwrap();
        mock.assert();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Cabo HDMI");
    }

    #[test]
    fn test_no_token_no_header() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/dashboard/stats")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"totalOrdensAbertas": 2, "faturamentoTotal": 10.5}"#)
            .create();
        let client = ApiClient::new(&server.url(), MemoryStorage::default()).unwrap();
        let stats = client.dashboard_stats().unwrap();
        mock.assert();
        assert_eq!(stats.total_ordens_abertas, 2);
    }

    #[test]
    fn test_token_is_read_per_request() {
        let mut server = Server::new();
        let first = server
            .mock("DELETE", "/api/clientes/4")
            .match_header("authorization", "Bearer tok123")
            .with_status(204)
            .create();
        let second = server
            .mock("DELETE", "/api/clientes/5")
            .match_header("authorization", "Bearer rotated")
            .with_status(204)
            .create();
        let client = logged_in(&server);
        client.delete(Resource::Clients, 4).unwrap();
        client.storage().set(TOKEN_KEY, "rotated").unwrap();
        client.delete(Resource::Clients, 5).unwrap();
        first.assert();
        second.assert();
    }

    #[test]
    fn test_unauthorized_clears_session() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/api/clientes")
            .with_status(401)
            .create();
        let client = logged_in(&server);
        let r = client.list::<ClientRecord>(Resource::Clients);
        assert!(matches!(r, Err(ApiError::Unauthorized)));
        assert_eq!(client.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(client.storage().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_unauthorized_on_login_route_keeps_storage() {
        let mut server = Server::new();
        let _m = server.mock("POST", LOGIN_PATH).with_status(401).create();
        let client = logged_in(&server);
        let r = client.send_json::<_, serde_json::Value>(Method::POST, LOGIN_PATH, &json!({}));
        assert!(matches!(r, Err(ApiError::Unauthorized)));
        assert_eq!(client.storage().get(TOKEN_KEY).unwrap().as_deref(), Some("tok123"));
    }

    #[test]
    fn test_error_message_from_backend() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/api/clientes")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Documento já cadastrado"}"#)
            .create();
        let client = logged_in(&server);
        let input = ClientInput {
            document: String::from("123.456.789-01"),
            name: String::from("Ana"),
            contact: String::from("(11) 98765-4321"),
            address: String::from("Rua C"),
        };
        let r = client.create::<_, ClientRecord>(Resource::Clients, &input);
        match r {
            Err(e @ ApiError::Status { .. }) => {
                assert_eq!(e.to_string(), "server returned 400 Bad Request: Documento já cadastrado");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_without_body() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/api/usuarios/9").with_status(500).create();
        let client = logged_in(&server);
        let r = client.fetch::<crate::models::User>(Resource::Users, 9);
        match r {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, None);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(client.storage().get(TOKEN_KEY).unwrap().is_some());
    }

    #[test]
    fn test_update_sends_json_body() {
        let mut server = Server::new();
        let mock = server
            .mock("PUT", "/api/servicos/3")
            .match_body(Matcher::PartialJson(json!({"nome": "Formatação", "valor": 80.0})))
            .with_status(200)
            .with_body(r#"{"id": 3, "nome": "Formatação", "valor": 80.0}"#)
            .create();
        let client = logged_in(&server);
        let service: crate::models::Service = client
            .update(Resource::Services, 3, &json!({"nome": "Formatação", "valor": 80.0}))
            .unwrap();
        mock.assert();
        assert_eq!(service.id, 3);
    }

    #[test]
    fn test_all_service_orders_follows_pages() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/api/ordens-servico")
            .match_query(Matcher::UrlEncoded("page".into(), "0".into()))
            .with_status(200)
            .with_body(
                json!({
                    "content": [{"id": 1, "status": "ABERTA"}, {"id": 2, "status": "ABERTA"}],
                    "totalElements": 3, "totalPages": 2, "size": 2, "number": 0
                })
                .to_string(),
            )
            .create();
        let _m = server
            .mock("GET", "/api/ordens-servico")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(
                json!({
                    "content": [{"id": 3, "status": "CONCLUIDA"}],
                    "totalElements": 3, "totalPages": 2, "size": 2, "number": 1
                })
                .to_string(),
            )
            .create();
        let client = logged_in(&server);
        let ids = client
            .all_service_orders()
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn test_pdf_download() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/api/pdf/ordem-servico/12")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.4 fake")
            .create();
        let client = logged_in(&server);
        assert_eq!(client.service_order_pdf(12).unwrap(), b"%PDF-1.4 fake");
    }

    #[test]
    fn test_network_error() {
        let client = ApiClient::new("http://127.0.0.1:1", MemoryStorage::default()).unwrap();
        assert!(matches!(
            client.dashboard_stats(),
            Err(ApiError::Network(_))
        ));
    }
}
