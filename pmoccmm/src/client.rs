//! Client des web services CCMM

use crate::error::{CcmmError, Result};
use crate::models::*;
use pmosoap::{CallContext, ClientConfig, HttpTransport, SoapClient, SoapPayload, SoapTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SERVICES_PATH: &str = "ccmmwebservices";

/// Services CCMM exposés au client web
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcmmService {
    Utility,
    Skillset,
    Customer,
    WebComms,
}

impl CcmmService {
    pub fn name(self) -> &'static str {
        match self {
            CcmmService::Utility => "CIUtilityWs",
            CcmmService::Skillset => "CISkillsetWs",
            CcmmService::Customer => "CICustomerWs",
            CcmmService::WebComms => "CIWebCommsWs",
        }
    }

    /// URL du service sous `base`
    pub fn endpoint(self, base: &str) -> String {
        format!(
            "{}/{}/{}.asmx",
            base.trim_end_matches('/'),
            SERVICES_PATH,
            self.name()
        )
    }
}

/// Client CCMM
///
/// Chaque service a son propre [`SoapClient`] ; tous partagent le même
/// transport et la même configuration (authentification, verbosité).
#[derive(Clone)]
pub struct CcmmClient {
    utility: SoapClient,
    skillset: SoapClient,
    customer: SoapClient,
    web_comms: SoapClient,
}

impl CcmmClient {
    /// Crée un client HTTP à partir de l'URL de base du serveur CCMM
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # fn run() -> pmoccmm::Result<()> {
    /// let client = pmoccmm::CcmmClient::new("http://ccmm.example.com")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(ClientConfig::new(base_url)?)
    }

    /// Crée un client HTTP ; l'endpoint de `config` sert d'URL de base
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let transport: Arc<dyn SoapTransport> = Arc::new(HttpTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Charge la configuration depuis un fichier YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(ClientConfig::load(path)?)
    }

    /// Crée un client sur un transport existant
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn SoapTransport>) -> Result<Self> {
        let base = config.endpoint().as_str().to_string();
        let service = |service: CcmmService| -> Result<SoapClient> {
            let config = config.for_endpoint(&service.endpoint(&base))?;
            debug!(service = service.name(), endpoint = %config.endpoint(), "CCMM service");
            Ok(SoapClient::new(config, transport.clone()))
        };

        Ok(Self {
            utility: service(CcmmService::Utility)?,
            skillset: service(CcmmService::Skillset)?,
            customer: service(CcmmService::Customer)?,
            web_comms: service(CcmmService::WebComms)?,
        })
    }

    pub fn service(&self, service: CcmmService) -> &SoapClient {
        match service {
            CcmmService::Utility => &self.utility,
            CcmmService::Skillset => &self.skillset,
            CcmmService::Customer => &self.customer,
            CcmmService::WebComms => &self.web_comms,
        }
    }

    async fn invoke<Req, Resp>(
        &self,
        ctx: &CallContext,
        service: CcmmService,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: SoapPayload + Serialize,
        Resp: DeserializeOwned + Default,
    {
        let action = format!("{}/{}", WS_NS, Req::ELEMENT);
        Ok(self.service(service).invoke(ctx, &action, request).await?)
    }

    // ============= CIUtilityWs =============

    /// Ouvre une session anonyme
    pub async fn anonymous_login(&self, ctx: &CallContext) -> Result<AnonymousSession> {
        let response: GetAnonymousSessionKeyResponse = self
            .invoke(ctx, CcmmService::Utility, &GetAnonymousSessionKey::new())
            .await?;

        let result = response.result;
        let anonymous_id = result
            .anonymous_id
            .trim()
            .parse::<i64>()
            .map_err(|_| CcmmError::InvalidAnonymousId(result.anonymous_id.clone()))?;

        Ok(AnonymousSession {
            session_key: result.session_key,
            anonymous_id,
        })
    }

    /// Associe une adresse email à la session anonyme et retourne l'ID client
    pub async fn customer_id(
        &self,
        ctx: &CallContext,
        session_key: &str,
        anonymous_id: i64,
        email: &str,
    ) -> Result<i64> {
        let request = GetAndUpdateAnonymousCustomerID::new(session_key, anonymous_id, email);
        let response: GetAndUpdateAnonymousCustomerIDResponse =
            self.invoke(ctx, CcmmService::Utility, &request).await?;
        Ok(response.result)
    }

    /// Ferme la session du client pour un contact
    pub async fn end_session(
        &self,
        ctx: &CallContext,
        session_key: &str,
        contact_id: i64,
    ) -> Result<()> {
        let request = CustomerLogoffByContactID::new(session_key, contact_id);
        let _: CustomerLogoffByContactIDResponse =
            self.invoke(ctx, CcmmService::Utility, &request).await?;
        Ok(())
    }

    // ============= CISkillsetWs =============

    pub async fn is_skillset_in_service(&self, ctx: &CallContext, name: &str) -> Result<bool> {
        let response: IsSkillsetNameInServiceResponse = self
            .invoke(ctx, CcmmService::Skillset, &IsSkillsetNameInService::new(name))
            .await?;
        Ok(response.result)
    }

    pub async fn skillset(
        &self,
        ctx: &CallContext,
        session_key: &str,
        name: &str,
    ) -> Result<Skillset> {
        let response: GetSkillsetByNameResponse = self
            .invoke(ctx, CcmmService::Skillset, &GetSkillsetByName::new(session_key, name))
            .await?;
        Ok(response.result)
    }

    // ============= CICustomerWs =============

    /// Demande un chat texte sur un skillset et retourne l'ID du contact
    pub async fn request_chat(
        &self,
        ctx: &CallContext,
        customer_id: i64,
        session_key: &str,
        skillset_id: i64,
    ) -> Result<i64> {
        let request = RequestTextChat::new(customer_id, session_key, skillset_id);
        let response: RequestTextChatResponse =
            self.invoke(ctx, CcmmService::Customer, &request).await?;
        Ok(response.result)
    }

    // ============= CIWebCommsWs =============

    /// Signale que le client est toujours présent
    pub async fn keep_alive(
        &self,
        ctx: &CallContext,
        session_key: &str,
        contact_id: i64,
        is_typing: bool,
    ) -> Result<()> {
        let request = UpdateAliveTimeAndUpdateIsTyping::new(session_key, contact_id, is_typing);
        let _: UpdateAliveTimeAndUpdateIsTypingResponse =
            self.invoke(ctx, CcmmService::WebComms, &request).await?;
        Ok(())
    }

    /// Lit les messages écrits depuis `last_read_time`
    pub async fn read_messages(
        &self,
        ctx: &CallContext,
        session_key: &str,
        contact_id: i64,
        is_writing: bool,
        last_read_time: CIDateTime,
    ) -> Result<ChatMessages> {
        let request = ReadChatMessage::new(session_key, contact_id, is_writing, last_read_time);
        let response: ReadChatMessageResponse =
            self.invoke(ctx, CcmmService::WebComms, &request).await?;

        debug!(
            contact_id,
            count = response.result.messages().len(),
            "Read chat messages"
        );
        Ok(response.result)
    }

    /// Écrit un message sur le contact et retourne le code renvoyé par le service
    pub async fn write_message(
        &self,
        ctx: &CallContext,
        session_key: &str,
        contact_id: i64,
        message: &str,
        message_type: ChatMessageType,
    ) -> Result<i64> {
        let request = WriteChatMessage::new(session_key, contact_id, message, message_type);
        let response: WriteChatMessageResponse =
            self.invoke(ctx, CcmmService::WebComms, &request).await?;

        info!(contact_id, result = response.result, "Chat message written");
        Ok(response.result)
    }

    /// Retire le contact de la file d'attente
    pub async fn abandon_queue(
        &self,
        ctx: &CallContext,
        session_key: &str,
        contact_id: i64,
        reason: &str,
    ) -> Result<()> {
        let request = AbandonQueuingWebCommsContact::new(session_key, contact_id, reason);
        let _: AbandonQueuingWebCommsContactResponse =
            self.invoke(ctx, CcmmService::WebComms, &request).await?;
        Ok(())
    }
}
