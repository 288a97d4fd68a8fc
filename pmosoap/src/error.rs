//! Gestion des erreurs pour le moteur SOAP

use crate::context::CancelCause;
use crate::fault::SoapFault;
use thiserror::Error;

/// Type Result personnalisé pour pmosoap
pub type Result<T> = std::result::Result<T, SoapError>;

/// Erreur opaque remontée par une implémentation de transport
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Erreurs possibles lors d'un appel SOAP
#[derive(Error, Debug)]
pub enum SoapError {
    /// La requête n'a pas pu être sérialisée (aucun appel réseau n'a eu lieu)
    #[error("Failed to marshal SOAP request: {0}")]
    Marshal(#[from] quick_xml::se::SeError),

    /// Erreur réseau ou HTTP
    #[error("SOAP transport error: {0}")]
    Transport(#[source] BoxError),

    /// L'appel a été annulé par le contexte de l'appelant
    #[error("SOAP call cancelled: {0}")]
    Cancelled(#[from] CancelCause),

    /// Le Body contient plus d'un élément
    #[error("Found multiple elements inside SOAP body; not wrapped-document/literal WS-I compliant")]
    ProtocolViolation,

    /// Aucune cible n'a été fournie pour recevoir la réponse
    #[error("SOAP response content must be a mutable target")]
    ContentTarget,

    /// Le service a répondu par un SOAP Fault
    #[error(transparent)]
    Fault(#[from] SoapFault),

    /// La réponse n'est pas une enveloppe SOAP exploitable
    #[error("Malformed SOAP envelope: {0}")]
    MalformedEnvelope(String),

    /// Erreur de syntaxe XML dans la réponse
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Le contenu du Body ne correspond pas au type attendu
    #[error("Failed to decode SOAP body content: {0}")]
    Decode(#[from] quick_xml::de::DeError),

    /// URL d'endpoint invalide
    #[error("Invalid SOAP endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl SoapError {
    /// Construit une erreur de transport depuis n'importe quelle erreur
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        SoapError::Transport(err.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        SoapError::MalformedEnvelope(message.into())
    }

    /// Retourne le SOAP Fault si le service en a renvoyé un
    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            SoapError::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Vérifie si l'erreur est un SOAP Fault (erreur métier attendue)
    pub fn is_fault(&self) -> bool {
        matches!(self, SoapError::Fault(_))
    }

    /// Vérifie si l'appel a été annulé ou a dépassé son échéance
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SoapError::Cancelled(_))
    }
}

impl From<reqwest::Error> for SoapError {
    fn from(err: reqwest::Error) -> Self {
        SoapError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_display_is_faultstring() {
        let err = SoapError::from(SoapFault::new("soap:Server", "Session expired"));
        assert_eq!(err.to_string(), "Session expired");
        assert!(err.is_fault());
        assert_eq!(err.fault().unwrap().code, "soap:Server");
    }

    #[test]
    fn test_cancelled_keeps_cause() {
        let err = SoapError::from(CancelCause::DeadlineExceeded);
        assert!(err.is_cancelled());
        assert!(!err.is_fault());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_transport_wraps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = SoapError::transport(io);
        assert!(err.to_string().contains("refused"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
