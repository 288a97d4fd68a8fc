//! # pmosoap - Moteur d'appels SOAP 1.1
//!
//! Cette crate construit une enveloppe SOAP autour d'un document métier, la
//! transmet en HTTP POST et décode la réponse en distinguant un document
//! normal d'un SOAP Fault, sans connaître le schéma du service.
//!
//! ## Fonctionnalités
//!
//! - ✅ Sérialisation indentée de l'enveloppe (header optionnel)
//! - ✅ Résolution Fault / document au décodage, un seul élément par Body
//! - ✅ Faults remontés comme erreurs ([`SoapError::Fault`])
//! - ✅ Annulation coopérative et échéances ([`CallContext`])
//! - ✅ Transport injectable ([`SoapTransport`], [`HttpTransport`])
//! - ✅ Configuration YAML avec surcharge par l'environnement
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`], [`SoapBody`], [`SoapHeader`] : modèle de l'enveloppe
//! - `resolver` : lecture du Body et choix Fault / document
//! - [`SoapTransport`] : échange HTTP unique
//! - [`SoapClient`] : façade `call(ctx, action, requête, réponse)`
//!
//! ## Example
//!
//! ```rust,no_run
//! use pmosoap::{CallContext, ClientConfig, SoapClient, SoapPayload};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct IsSkillsetNameInService {
//!     #[serde(rename = "skillsetName")]
//!     skillset_name: String,
//! }
//!
//! impl SoapPayload for IsSkillsetNameInService {
//!     const ELEMENT: &'static str = "IsSkillsetNameInService";
//! }
//!
//! #[derive(Default, Deserialize)]
//! struct IsSkillsetNameInServiceResponse {
//!     #[serde(rename = "IsSkillsetNameInServiceResult")]
//!     result: bool,
//! }
//!
//! # async fn run() -> pmosoap::Result<()> {
//! let config = ClientConfig::new("http://ccmm.example.com/ccmmwebservices/CISkillsetWs.asmx")?;
//! let client = SoapClient::with_http(config)?;
//!
//! let mut response = IsSkillsetNameInServiceResponse::default();
//! client
//!     .call(
//!         &CallContext::background(),
//!         "http://webservices.ci.ccmm.applications.nortel.com/IsSkillsetNameInService",
//!         &IsSkillsetNameInService { skillset_name: "WC_Default_Skillset".into() },
//!         Some(&mut response),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod context;
mod envelope;
mod error;
mod fault;
mod resolver;
mod transport;

pub use client::SoapClient;
pub use config::{BasicAuth, ClientConfig, ClientSettings};
pub use context::{CallContext, CancelCause};
pub use envelope::{SoapBody, SoapEnvelope, SoapHeader, SoapPayload, decode_body};
pub use error::{BoxError, Result, SoapError};
pub use fault::{SoapFault, build_soap_fault};
pub use transport::{
    HttpTransport, SOAP_ACTION_HEADER, SOAP_CONTENT_TYPE, SoapRequest, SoapResponse,
    SoapTransport,
};

/// Namespace de l'enveloppe SOAP 1.1
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Préfixe utilisé pour l'enveloppe sortante
pub const SOAP_ENV_PREFIX: &str = "soap";
