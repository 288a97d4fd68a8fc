//! Contexte d'appel : annulation coopérative et échéance
//!
//! Un [`CallContext`] accompagne chaque appel SOAP. Il combine un
//! [`CancellationToken`] (annulation explicite, éventuellement partagée entre
//! plusieurs appels) et une échéance optionnelle. Le moteur n'impose aucun
//! timeout par défaut : sans échéance, seul le transport HTTP peut abandonner.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Raison de l'interruption d'un appel
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// Le token d'annulation a été déclenché
    #[error("context canceled")]
    Cancelled,

    /// L'échéance du contexte est dépassée
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Contexte d'un appel SOAP
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Contexte sans annulation ni échéance
    pub fn background() -> Self {
        Self::default()
    }

    /// Contexte piloté par un token d'annulation existant
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Ajoute une échéance relative ; la plus proche des échéances l'emporte
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Ajoute une échéance absolue ; la plus proche des échéances l'emporte
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Contexte enfant : annulé avec le parent, annulable seul
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Annule tous les appels qui partagent ce token
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Retourne la cause si le contexte est déjà terminé
    pub fn check(&self) -> Option<CancelCause> {
        if self.token.is_cancelled() {
            return Some(CancelCause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Se termine quand le contexte est annulé ou que l'échéance est atteinte
    pub async fn done(&self) -> CancelCause {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CancelCause::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelCause::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelCause::Cancelled
            }
        }
    }
}
