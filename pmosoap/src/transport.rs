//! Transport HTTP des enveloppes SOAP
//!
//! Le transport est injecté explicitement dans le client : [`HttpTransport`]
//! (reqwest) en production, n'importe quelle implémentation de
//! [`SoapTransport`] dans les tests.

use crate::config::BasicAuth;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONNECTION, CONTENT_TYPE};
use tracing::debug;
use url::Url;

/// Content-Type des requêtes SOAP 1.1
pub const SOAP_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

/// En-tête HTTP portant l'action SOAP
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

const USER_AGENT: &str = concat!("pmosoap/", env!("CARGO_PKG_VERSION"));

/// Requête HTTP prête à être émise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    pub url: Url,
    /// Action SOAP ; `None` quand l'appelant n'en fournit pas
    pub action: Option<String>,
    pub auth: Option<BasicAuth>,
    /// Enveloppe sérialisée
    pub body: Vec<u8>,
}

/// Réponse HTTP brute
///
/// Le corps est toujours lu, quel que soit le code HTTP : un SOAP Fault
/// arrive typiquement avec un statut 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    pub status: u16,
    pub raw_body: Vec<u8>,
}

/// Échange HTTP unique portant une enveloppe SOAP
#[async_trait]
pub trait SoapTransport: Send + Sync {
    /// Émet la requête et lit la totalité de la réponse en mémoire
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse>;
}

/// Transport HTTP basé sur reqwest
///
/// Le `Client` reqwest gère son propre pool de connexions et peut être
/// partagé entre appels concurrents.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Utilise un client reqwest déjà configuré (timeouts, proxy, certificats…)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SoapTransport for HttpTransport {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse> {
        let mut builder = self
            .client
            .post(request.url.clone())
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header(CONNECTION, "close")
            .body(request.body);

        if let Some(action) = request.action.as_deref().filter(|a| !a.is_empty()) {
            builder = builder.header(SOAP_ACTION_HEADER, action);
        }

        if let Some(auth) = &request.auth {
            builder = builder.basic_auth(&auth.login, Some(&auth.password));
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("SOAP response status from {}: {}", request.url, status);

        // Le corps est entièrement lu avant de rendre la connexion
        let raw_body = response.bytes().await?.to_vec();

        Ok(SoapResponse {
            status: status.as_u16(),
            raw_body,
        })
    }
}
