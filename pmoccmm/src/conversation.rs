//! Conversation de chat entre un client anonyme et un agent

use crate::client::CcmmClient;
use crate::error::{CcmmError, Result};
use crate::models::{CIDateTime, ChatMessageType, ChatMessages, Skillset};
use pmosoap::CallContext;
use tracing::{info, warn};

/// Conversation ouverte sur un skillset
///
/// Créée par [`Conversation::start_direct`], elle conserve la session et le
/// contact obtenus à l'ouverture, ainsi que l'horodatage du dernier message
/// lu pour ne relire que les nouveaux messages.
#[derive(Clone)]
pub struct Conversation {
    client: CcmmClient,
    name: String,
    customer_id: i64,
    session_key: String,
    contact_id: i64,
    skillset: Skillset,
    last_read_time: CIDateTime,
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("name", &self.name)
            .field("customer_id", &self.customer_id)
            .field("contact_id", &self.contact_id)
            .field("skillset", &self.skillset)
            .finish()
    }
}

impl Conversation {
    /// Ouvre une conversation sans vérifier la disponibilité du skillset
    ///
    /// Enchaîne la connexion anonyme, l'enregistrement du client, la
    /// recherche du skillset et la demande de chat.
    pub async fn start_direct(
        ctx: &CallContext,
        client: &CcmmClient,
        name: &str,
        email: &str,
        skillset_name: &str,
    ) -> Result<Self> {
        let session = client.anonymous_login(ctx).await?;
        let customer_id = client
            .customer_id(ctx, &session.session_key, session.anonymous_id, email)
            .await?;
        let skillset = client
            .skillset(ctx, &session.session_key, skillset_name)
            .await?;
        let contact_id = client
            .request_chat(ctx, customer_id, &session.session_key, skillset.id)
            .await?;

        info!(
            customer_id,
            contact_id,
            skillset = %skillset.name,
            "Conversation started"
        );

        Ok(Self {
            client: client.clone(),
            name: name.to_string(),
            customer_id,
            session_key: session.session_key,
            contact_id,
            skillset,
            last_read_time: CIDateTime::default(),
        })
    }

    /// Ouvre une conversation si le skillset accepte des contacts
    pub async fn start(
        ctx: &CallContext,
        client: &CcmmClient,
        name: &str,
        email: &str,
        skillset_name: &str,
    ) -> Result<Self> {
        if !client.is_skillset_in_service(ctx, skillset_name).await? {
            warn!(skillset = skillset_name, "Skillset is not in service");
            return Err(CcmmError::SkillsetNotInService(skillset_name.to_string()));
        }
        Self::start_direct(ctx, client, name, email, skillset_name).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn customer_id(&self) -> i64 {
        self.customer_id
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn contact_id(&self) -> i64 {
        self.contact_id
    }

    pub fn skillset(&self) -> &Skillset {
        &self.skillset
    }

    pub fn last_read_time(&self) -> CIDateTime {
        self.last_read_time
    }

    /// Lit les messages arrivés depuis la dernière lecture
    pub async fn read(&mut self, ctx: &CallContext, is_writing: bool) -> Result<ChatMessages> {
        let messages = self
            .client
            .read_messages(
                ctx,
                &self.session_key,
                self.contact_id,
                is_writing,
                self.last_read_time,
            )
            .await?;

        if let Some(last) = messages.last_write_time() {
            self.last_read_time = self.last_read_time.max(last);
        }
        Ok(messages)
    }

    /// Envoie un message du client
    pub async fn write(&self, ctx: &CallContext, message: &str) -> Result<i64> {
        self.client
            .write_message(
                ctx,
                &self.session_key,
                self.contact_id,
                message,
                ChatMessageType::ChatMessageFromCustomer,
            )
            .await
    }

    pub async fn keep_alive(&self, ctx: &CallContext, is_typing: bool) -> Result<()> {
        self.client
            .keep_alive(ctx, &self.session_key, self.contact_id, is_typing)
            .await
    }

    /// Quitte la file d'attente avant la prise en charge par un agent
    pub async fn abandon(&self, ctx: &CallContext, reason: &str) -> Result<()> {
        self.client
            .abandon_queue(ctx, &self.session_key, self.contact_id, reason)
            .await
    }

    /// Signale la déconnexion du client puis ferme la session
    pub async fn end(self, ctx: &CallContext) -> Result<()> {
        self.client
            .write_message(
                ctx,
                &self.session_key,
                self.contact_id,
                "",
                ChatMessageType::SessionDisconnectedByCustomer,
            )
            .await?;
        self.client
            .end_session(ctx, &self.session_key, self.contact_id)
            .await?;

        info!(contact_id = self.contact_id, "Conversation ended");
        Ok(())
    }
}
