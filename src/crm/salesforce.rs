//! Salesforce implementation of [`CrmClient`]
//!
//! Logs in through the partner SOAP `login` call (username plus password with
//! the security token appended), then talks to the REST API of the instance
//! the login returned:
//!
//! - `GET  /services/data/v{version}/query?q=...` for name lookups
//! - `POST /services/data/v{version}/sobjects/{Object}/` for creates
//!
//! Requests carry a timeout but are never retried.

use crate::config::{Credentials, Mode};
use crate::crm::{CrmClient, CrmError, RecordId};
use crate::types::{Contact, OpportunityPayload};
use async_trait::async_trait;
use quick_xml::escape::escape;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
pub const DEFAULT_API_VERSION: &str = "59.0";

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesforceConfig {
    /// Scheme and host of the login endpoint
    pub login_url: String,
    pub api_version: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl SalesforceConfig {
    /// Settings for the production or sandbox login host
    pub fn for_mode(mode: Mode) -> Self {
        let login_url = match mode {
            Mode::Test => SANDBOX_LOGIN_URL,
            Mode::Production => PRODUCTION_LOGIN_URL,
        };
        Self {
            login_url: login_url.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the login host.
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    total_size: u64,
    records: Vec<QueryRecord>,
}

#[derive(Debug, Deserialize)]
struct QueryRecord {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    message: String,
    error_code: String,
}

// SOAP login response. Element names are matched with and without the
// envelope prefix; unknown elements and attributes are ignored.
#[derive(Debug, Deserialize)]
struct SoapEnvelope {
    #[serde(rename = "Body", alias = "soapenv:Body", alias = "env:Body", alias = "soap:Body")]
    body: SoapBody,
}

#[derive(Debug, Deserialize)]
struct SoapBody {
    #[serde(rename = "loginResponse", default)]
    login_response: Option<LoginResponse>,

    #[serde(
        rename = "Fault",
        alias = "soapenv:Fault",
        alias = "env:Fault",
        alias = "soap:Fault",
        default
    )]
    fault: Option<SoapFault>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    result: LoginResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult {
    server_url: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SoapFault {
    #[serde(default)]
    faultstring: String,
}

/// Authenticated Salesforce session
#[derive(Debug, Clone)]
pub struct SalesforceClient {
    http: Client,
    instance_url: String,
    session_id: String,
    api_version: String,
}

impl SalesforceClient {
    /// Log in and open a session
    ///
    /// # Errors
    ///
    /// * `CrmError::Auth` if the login is refused
    /// * `CrmError::Transport` if the login host cannot be reached
    /// * `CrmError::Decode` if the response lacks a session
    pub async fn login(
        config: &SalesforceConfig,
        credentials: &Credentials,
    ) -> Result<Self, CrmError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        let url = format!(
            "{}/services/Soap/u/{}",
            config.login_url.trim_end_matches('/'),
            config.api_version
        );
        let body = login_envelope(credentials);

        debug!(%url, username = %credentials.username, "Logging in");
        let response = http
            .post(&url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = read_envelope(&text)
                .ok()
                .and_then(|body| body.fault)
                .map(|fault| fault.faultstring)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(CrmError::Auth { message });
        }

        let LoginResult {
            server_url,
            session_id,
        } = read_envelope(&text)?
            .login_response
            .ok_or_else(|| CrmError::Decode {
                message: "login response has no result".to_string(),
            })?
            .result;
        let instance_url = instance_of(&server_url).ok_or_else(|| CrmError::Decode {
            message: format!("unrecognised serverUrl '{}'", server_url),
        })?;

        info!(instance = %instance_url, "Logged in to CRM");

        Ok(Self::with_session(
            http,
            instance_url,
            session_id,
            &config.api_version,
        ))
    }

    /// Wrap an existing session
    pub fn with_session(
        http: Client,
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            api_version: api_version.into(),
        }
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Map a non-success response to a typed error
    async fn error_from(response: Response) -> CrmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let reason = serde_json::from_str::<Vec<ApiError>>(&body)
            .ok()
            .filter(|errors| !errors.is_empty())
            .map(|errors| {
                errors
                    .iter()
                    .map(|e| format!("{}: {}", e.error_code, e.message))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_else(|| body.chars().take(200).collect());

        if status == StatusCode::UNAUTHORIZED {
            CrmError::Auth { message: reason }
        } else {
            CrmError::Rejected {
                status: status.as_u16(),
                reason,
            }
        }
    }

    async fn create<T: Serialize + Sync>(
        &self,
        object: &str,
        record: &T,
    ) -> Result<RecordId, CrmError> {
        let response = self
            .http
            .post(self.data_url(&format!("sobjects/{}/", object)))
            .bearer_auth(&self.session_id)
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let created: CreateResponse = response.json().await?;
        debug!(object, id = %created.id, "Record created");
        Ok(created.id)
    }
}

#[async_trait]
impl CrmClient for SalesforceClient {
    async fn lookup_id(&self, object: &str, name: &str) -> Result<Option<RecordId>, CrmError> {
        let soql = format!(
            "SELECT Id FROM {} WHERE Name = '{}' LIMIT 1",
            object,
            soql_escape(name)
        );

        let response = self
            .http
            .get(self.data_url("query"))
            .bearer_auth(&self.session_id)
            .query(&[("q", soql.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let result: QueryResponse = response.json().await?;
        debug!(object, name, total = result.total_size, "Lookup finished");
        Ok(result.records.into_iter().next().map(|r| r.id))
    }

    async fn create_opportunity(
        &self,
        payload: &OpportunityPayload,
    ) -> Result<RecordId, CrmError> {
        self.create("Opportunity", payload).await
    }

    async fn create_contact(&self, contact: &Contact) -> Result<RecordId, CrmError> {
        self.create("Contact", contact).await
    }
}

fn login_envelope(credentials: &Credentials) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8" ?>"#,
            r#"<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<env:Body><n1:login xmlns:n1="urn:partner.soap.sforce.com">"#,
            "<n1:username>{}</n1:username>",
            "<n1:password>{}{}</n1:password>",
            "</n1:login></env:Body></env:Envelope>"
        ),
        escape(&credentials.username),
        escape(&credentials.password),
        escape(&credentials.security_token),
    )
}

/// Body of a SOAP response envelope
fn read_envelope(text: &str) -> Result<SoapBody, CrmError> {
    quick_xml::de::from_str::<SoapEnvelope>(text)
        .map(|envelope| envelope.body)
        .map_err(|e| CrmError::Decode {
            message: format!("malformed SOAP response: {}", e),
        })
}

/// Scheme, host and port of a SOAP server URL
fn instance_of(server_url: &str) -> Option<String> {
    let url = Url::parse(server_url).ok()?;
    url.host_str()?;
    Some(url.origin().ascii_serialization())
}

fn soql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
