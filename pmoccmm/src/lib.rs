//! # pmoccmm - Client des web services CCMM
//!
//! Appels typés vers les services « customer interface » d'un centre de
//! contact CCMM, construits sur [`pmosoap`]. Chaque opération prend un
//! [`CallContext`] qui porte l'annulation et l'échéance de l'appel.
//!
//! ## Services
//!
//! - `CIUtilityWs` : session anonyme, identifiant client, déconnexion
//! - `CISkillsetWs` : disponibilité et recherche de skillsets
//! - `CICustomerWs` : demande de chat texte
//! - `CIWebCommsWs` : lecture/écriture de messages, présence, abandon
//!
//! ## Example
//!
//! ```rust,no_run
//! use pmoccmm::{CallContext, CcmmClient, Conversation};
//! use std::time::Duration;
//!
//! # async fn run() -> pmoccmm::Result<()> {
//! let client = CcmmClient::new("http://ccmm.example.com")?;
//! let ctx = CallContext::background().with_timeout(Duration::from_secs(30));
//!
//! let mut conversation = Conversation::start_direct(
//!     &ctx,
//!     &client,
//!     "Jane Doe",
//!     "jane@example.com",
//!     "WC_Default_Skillset",
//! )
//! .await?;
//!
//! conversation.write(&ctx, "Bonjour").await?;
//! for message in conversation.read(&ctx, false).await?.messages() {
//!     println!("{}", message.message);
//! }
//! conversation.end(&ctx).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod conversation;
mod error;
mod models;

pub use client::{CcmmClient, CcmmService};
pub use conversation::Conversation;
pub use error::{CcmmError, Result};
pub use models::{
    AnonymousSession, CIDateTime, ChatMessage, ChatMessageList, ChatMessageType, ChatMessages,
    DATATYPES_NS, Skillset, WS_NS,
};

pub use pmosoap::{CallContext, ClientConfig};
