//! Gestion des erreurs pour les services CCMM

use pmosoap::{SoapError, SoapFault};
use thiserror::Error;

/// Type Result personnalisé pour pmoccmm
pub type Result<T> = std::result::Result<T, CcmmError>;

/// Erreurs possibles lors d'un échange avec les services CCMM
#[derive(Error, Debug)]
pub enum CcmmError {
    /// Erreur du moteur SOAP (transport, Fault, réponse invalide…)
    #[error(transparent)]
    Soap(#[from] SoapError),

    /// L'identifiant anonyme renvoyé par le service n'est pas un entier
    #[error("Failed to convert anonymousID to int64: {0}")]
    InvalidAnonymousId(String),

    /// Le skillset demandé n'accepte pas de contact
    #[error("Skillset {0} is not in service")]
    SkillsetNotInService(String),

    /// Erreur de configuration
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl CcmmError {
    /// Retourne le SOAP Fault si le service en a renvoyé un
    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            CcmmError::Soap(err) => err.fault(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CcmmError::Soap(err) if err.is_cancelled())
    }
}
