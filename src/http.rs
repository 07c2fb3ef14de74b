// 🌐 HTTP API Client - reqwest implementation of the API traits
// One pooled client built from ApiConfig; each trait method maps onto a REST
// endpoint below the configured base path.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{BillsApi, DateRange, IncomeApi, RequestOptions, SystemApi};
use crate::config::ApiConfig;
use crate::entities::{Bill, Income, Month, NewBill, NewIncome, User};
use crate::error::{ApiError, ApiResult};

/// Credentials attached to each request.
#[derive(Clone)]
enum Auth {
    None,
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

/// HTTP client for the bill tracker backend.
///
/// Clone is cheap: the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
    auth: Auth,
}

impl fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match self.auth {
            Auth::None => "none",
            Auth::Bearer(_) => "bearer",
            Auth::Basic { .. } => "basic",
        };
        f.debug_struct("HttpApi")
            .field("base", &self.base.as_str())
            .field("auth", &auth)
            .finish()
    }
}

impl HttpApi {
    /// Build a client from runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base path is not an absolute URL or
    /// a configured header is not a valid HTTP header.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let base = Url::parse(config.base_url())
            .map_err(|e| ApiError::Config(format!("base path {:?}: {}", config.base_url(), e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Config(format!("base path {:?} cannot hold a path", base.as_str())));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in config.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Config(format!("header name {:?}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Config(format!("header {:?}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ApiError::Config(format!("api key: {}", e)))?;
            headers.insert("x-api-key", value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let auth = match (&config.access_token, &config.username) {
            (Some(token), _) => Auth::Bearer(token.clone()),
            (None, Some(username)) => Auth::Basic {
                username: username.clone(),
                password: config.password.clone(),
            },
            (None, None) => Auth::None,
        };

        tracing::debug!(base = %base, "API client configured");
        Ok(HttpApi { client, base, auth })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Absolute URL for the given path segments; each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config("base path cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, password.as_ref()),
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> ApiResult<T> {
        let builder = self.request(Method::GET, url).query(query);
        Self::read(builder.send().await?).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        // Upload progress only applies to requests that carry a body
        if body.is_some() {
            options.report_upload(1.0);
        }
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl BillsApi for HttpApi {
    async fn get_all_bills(&self, range: DateRange, _options: &RequestOptions) -> ApiResult<Vec<Bill>> {
        self.get(self.endpoint(&["bills"])?, &range.query()).await
    }

    async fn get_bill(&self, id: &str, _options: &RequestOptions) -> ApiResult<Bill> {
        self.get(self.endpoint(&["bills", id])?, &[]).await
    }

    async fn update_bill(&self, id: &str, bill: &Bill, options: &RequestOptions) -> ApiResult<Bill> {
        let url = self.endpoint(&["bills", id])?;
        self.send_json(Method::PUT, url, Some(bill), options).await
    }

    async fn add_bill(&self, bill: &NewBill, options: &RequestOptions) -> ApiResult<Bill> {
        let url = self.endpoint(&["bills"])?;
        self.send_json(Method::POST, url, Some(bill), options).await
    }

    async fn update_paid_status(
        &self,
        id: &str,
        year: i32,
        month: u32,
        paid: bool,
        options: &RequestOptions,
    ) -> ApiResult<Month> {
        let year = year.to_string();
        let month = month.to_string();
        let mut url = self.endpoint(&["bills", id, "paid", &year, &month])?;
        url.query_pairs_mut().append_pair("paid", if paid { "true" } else { "false" });
        self.send_json::<(), _>(Method::PUT, url, None, options).await
    }
}

impl IncomeApi for HttpApi {
    async fn get_income_sources(
        &self,
        range: DateRange,
        _options: &RequestOptions,
    ) -> ApiResult<Vec<Income>> {
        self.get(self.endpoint(&["income"])?, &range.query()).await
    }

    async fn get_income(&self, id: &str, _options: &RequestOptions) -> ApiResult<Income> {
        self.get(self.endpoint(&["income", id])?, &[]).await
    }

    async fn update_income(
        &self,
        id: &str,
        income: &Income,
        options: &RequestOptions,
    ) -> ApiResult<Income> {
        let url = self.endpoint(&["income", id])?;
        self.send_json(Method::PUT, url, Some(income), options).await
    }

    async fn add_income_source(
        &self,
        income: &NewIncome,
        options: &RequestOptions,
    ) -> ApiResult<Income> {
        let url = self.endpoint(&["income"])?;
        self.send_json(Method::POST, url, Some(income), options).await
    }
}

impl SystemApi for HttpApi {
    async fn get_current_user(&self) -> ApiResult<User> {
        self.get(self.endpoint(&["system", "user"])?, &[]).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::config::BaseOptions;

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = HttpApi::new(&ApiConfig::with_base_path("http://localhost:7080/api/")).unwrap();
        let url = api.endpoint(&["bills", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:7080/api/bills/a%2Fb%20c");
    }

    #[test]
    fn test_new_rejects_relative_base_path() {
        let err = HttpApi::new(&ApiConfig::with_base_path("/api")).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_new_rejects_bad_header() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let config = ApiConfig {
            base_options: Some(BaseOptions {
                headers,
                timeout: None,
            }),
            ..ApiConfig::default()
        };
        assert!(matches!(HttpApi::new(&config), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_token_wins_over_basic_auth() {
        let config = ApiConfig {
            username: Some("jdoe".to_string()),
            password: Some("pw".to_string()),
            access_token: Some("tok".to_string()),
            ..ApiConfig::default()
        };
        let api = HttpApi::new(&config).unwrap();
        assert!(matches!(api.auth, Auth::Bearer(_)));
        assert!(!format!("{:?}", api).contains("tok"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let api = HttpApi::new(&ApiConfig::with_base_path("http://127.0.0.1:9")).unwrap();
        let err = api.get_current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[cfg(feature = "server")]
    mod against_dev_backend {
        use super::*;
        use crate::server::Backend;
        use chrono::NaiveDate;

        async fn spawn(backend: Backend) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, crate::server::router(backend)).await.unwrap();
            });
            format!("http://{}", addr)
        }

        fn date(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        #[tokio::test]
        async fn test_bill_round_trip() {
            let base = spawn(Backend::new()).await;
            let api = HttpApi::new(&ApiConfig::with_base_path(base)).unwrap();
            let options = RequestOptions::new();

            let created = api
                .add_bill(&NewBill::new("Internet", 60.0, 12, date(2024, 1, 1)), &options)
                .await
                .unwrap();
            let id = created.id.clone().unwrap();
            assert_eq!(created.months.as_ref().unwrap().len(), 12);

            let all = api.get_all_bills(DateRange::all(), &options).await.unwrap();
            assert_eq!(all.len(), 1);

            let month = api.update_paid_status(&id, 2024, 3, true, &options).await.unwrap();
            assert_eq!(month.key(), (2024, 3, 12));
            assert!(month.paid);

            let mut edited = api.get_bill(&id, &options).await.unwrap();
            assert!(edited.month(2024, 3, 12).unwrap().paid);
            edited.amount = 65.0;
            let saved = api.update_bill(&id, &edited, &options).await.unwrap();
            assert_eq!(saved.amount, 65.0);
        }

        #[tokio::test]
        async fn test_missing_bill_is_404() {
            let base = spawn(Backend::new()).await;
            let api = HttpApi::new(&ApiConfig::with_base_path(base)).unwrap();

            let err = api.get_bill("nope", &RequestOptions::new()).await.unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn test_income_round_trip_with_range() {
            let base = spawn(Backend::new()).await;
            let api = HttpApi::new(&ApiConfig::with_base_path(base)).unwrap();
            let options = RequestOptions::new();

            let early = NewIncome::new(
                "Bonus",
                1000.0,
                crate::entities::IncomeFrequency::Once,
                date(2023, 12, 20),
            );
            let late = NewIncome::new(
                "Salary",
                2500.0,
                crate::entities::IncomeFrequency::Monthly,
                date(2024, 2, 1),
            );
            api.add_income_source(&early, &options).await.unwrap();
            let salary = api.add_income_source(&late, &options).await.unwrap();

            let range = DateRange::new(Some(date(2024, 1, 1)), None);
            let listed = api.get_income_sources(range, &options).await.unwrap();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].name, "Salary");

            let fetched = api.get_income(salary.id().unwrap(), &options).await.unwrap();
            assert_eq!(fetched, salary);
        }

        /// Server answering `/system/user` with the request headers packed
        /// into the user: `id` = X-API-Key, `username` = Authorization,
        /// `display_name` = X-Tenant.
        async fn spawn_header_echo() -> String {
            use axum::http::HeaderMap;
            use axum::routing::get;
            use axum::{Json, Router};

            async fn echo(headers: HeaderMap) -> Json<User> {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                Json(User {
                    id: header("x-api-key").unwrap_or_default(),
                    username: header("authorization").unwrap_or_default(),
                    display_name: header("x-tenant"),
                    email: None,
                })
            }

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let app = Router::new().route("/system/user", get(echo));
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}", addr)
        }

        #[tokio::test]
        async fn test_api_key_and_base_headers_sent() {
            let base = spawn_header_echo().await;
            let mut headers = HashMap::new();
            headers.insert("X-Tenant".to_string(), "household".to_string());
            let config = ApiConfig {
                api_key: Some("key-123".to_string()),
                base_options: Some(BaseOptions {
                    headers,
                    timeout: Some(5_000),
                }),
                ..ApiConfig::with_base_path(base)
            };

            let echoed = HttpApi::new(&config).unwrap().get_current_user().await.unwrap();
            assert_eq!(echoed.id, "key-123");
            assert_eq!(echoed.display_name.as_deref(), Some("household"));
            assert_eq!(echoed.username, "");
        }

        #[tokio::test]
        async fn test_basic_auth_without_token() {
            let base = spawn_header_echo().await;
            let config = ApiConfig {
                username: Some("jdoe".to_string()),
                password: Some("pw".to_string()),
                ..ApiConfig::with_base_path(base)
            };

            let echoed = HttpApi::new(&config).unwrap().get_current_user().await.unwrap();
            assert_eq!(echoed.username, "Basic amRvZTpwdw==");
            assert_eq!(echoed.id, "");
        }

        #[tokio::test]
        async fn test_token_sent_instead_of_basic_auth() {
            let base = spawn_header_echo().await;
            let config = ApiConfig {
                username: Some("jdoe".to_string()),
                password: Some("pw".to_string()),
                access_token: Some("tok".to_string()),
                ..ApiConfig::with_base_path(base)
            };

            let echoed = HttpApi::new(&config).unwrap().get_current_user().await.unwrap();
            assert_eq!(echoed.username, "Bearer tok");
        }

        #[tokio::test]
        async fn test_upload_progress_reported_for_bodies_only() {
            use std::sync::{Arc, Mutex};

            let base = spawn(Backend::new()).await;
            let api = HttpApi::new(&ApiConfig::with_base_path(base)).unwrap();
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let options = RequestOptions::new().on_upload_progress(move |f| sink.lock().unwrap().push(f));

            let created = api
                .add_bill(&NewBill::new("Water", 45.0, 3, date(2024, 1, 1)), &options)
                .await
                .unwrap();
            assert_eq!(*seen.lock().unwrap(), vec![1.0]);

            api.update_paid_status(created.id().unwrap(), 2024, 1, true, &options)
                .await
                .unwrap();
            assert_eq!(*seen.lock().unwrap(), vec![1.0]);

            api.get_bill(created.id().unwrap(), &options).await.unwrap();
            assert_eq!(seen.lock().unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_bearer_token_required_when_configured() {
            let base = spawn(Backend::new().with_token("s3cret")).await;

            let anonymous = HttpApi::new(&ApiConfig::with_base_path(base.clone())).unwrap();
            let err = anonymous.get_current_user().await.unwrap_err();
            assert_eq!(err.status(), Some(401));

            let config = ApiConfig {
                access_token: Some("s3cret".to_string()),
                ..ApiConfig::with_base_path(base)
            };
            let user = HttpApi::new(&config).unwrap().get_current_user().await.unwrap();
            assert_eq!(user.username, "demo");
        }
    }
}
