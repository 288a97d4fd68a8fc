//! Ouvre une conversation de chat sur un serveur CCMM
//!
//! Usage :
//!
//! ```text
//! cargo run -p pmoccmm --example open_conversation -- ccmm.yaml
//! ```
//!
//! avec un fichier de configuration de la forme :
//!
//! ```yaml
//! endpoint: http://ccmm.example.com
//! verbose: true
//! ```
//!
//! Les variables `PMOSOAP__ENDPOINT`, `PMOSOAP__VERBOSE`... surchargent le fichier.

use pmoccmm::{CallContext, CcmmClient, Conversation};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialiser le logging
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ccmm.yaml".to_string());

    println!("=== PMOCcmm - Ouverture d'une conversation ===\n");

    let client = CcmmClient::load(&path)?;
    let ctx = CallContext::background().with_timeout(Duration::from_secs(60));

    if !client.is_skillset_in_service(&ctx, "WC_Default_Skillset").await? {
        println!("✗ Aucun agent disponible");
        return Ok(());
    }

    let mut conversation = Conversation::start_direct(
        &ctx,
        &client,
        "Testy McTestface",
        "test@test.io",
        "WC_Default_Skillset",
    )
    .await?;

    println!("✓ Conversation ouverte");
    println!("  Client: {}", conversation.customer_id());
    println!("  Contact: {}", conversation.contact_id());
    println!("  Skillset: {}", conversation.skillset().name);

    conversation.write(&ctx, "Bonjour !").await?;

    for _ in 0..5 {
        conversation.keep_alive(&ctx, false).await?;
        let messages = conversation.read(&ctx, false).await?;
        for message in messages.messages() {
            println!("  [{}] {}", message.message_type.as_str(), message.message);
        }
        if messages.messages().iter().any(|m| m.message_type.is_disconnect()) {
            break;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    conversation.end(&ctx).await?;
    println!("\n✓ Conversation terminée");

    Ok(())
}
