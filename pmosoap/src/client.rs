//! Client SOAP : enveloppe, transport et résolution de la réponse

use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::envelope::{SoapBody, SoapEnvelope, SoapPayload, decode_body};
use crate::error::{Result, SoapError};
use crate::transport::{HttpTransport, SoapRequest, SoapTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Client SOAP pour un endpoint
///
/// Le client ne garde aucun état entre deux appels : il peut être cloné et
/// utilisé depuis plusieurs tâches en parallèle, chacune avec sa propre
/// paire requête/réponse.
#[derive(Clone)]
pub struct SoapClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn SoapTransport>,
}

impl SoapClient {
    /// Crée un client avec un transport explicite
    pub fn new(config: ClientConfig, transport: Arc<dyn SoapTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Crée un client avec un transport HTTP dédié
    pub fn with_http(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(config, Arc::new(HttpTransport::new()?)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport partagé, réutilisable pour d'autres endpoints
    pub fn transport(&self) -> Arc<dyn SoapTransport> {
        self.transport.clone()
    }

    /// Invoque une action SOAP
    ///
    /// # Arguments
    ///
    /// * `ctx` - Contexte d'annulation et d'échéance de l'appel
    /// * `soap_action` - Valeur de l'en-tête `SOAPAction` (omis si vide)
    /// * `request` - Document placé dans le Body de la requête
    /// * `response` - Cible recevant le document de la réponse
    ///
    /// # Returns
    ///
    /// `Ok(())` si le service a répondu par un document (ou par une réponse
    /// vide, auquel cas `response` n'est pas modifié). Un SOAP Fault est
    /// renvoyé sous forme de [`SoapError::Fault`] et laisse `response` intact.
    pub async fn call<Req, Resp>(
        &self,
        ctx: &CallContext,
        soap_action: &str,
        request: &Req,
        response: Option<&mut Resp>,
    ) -> Result<()>
    where
        Req: SoapPayload + Serialize,
        Resp: DeserializeOwned,
    {
        let Some(response) = response else {
            return Err(SoapError::ContentTarget);
        };

        let verbose = self.config.is_verbose();
        let body = SoapEnvelope::with_header(self.config.header(), request).to_xml()?;

        if verbose {
            info!("{}", String::from_utf8_lossy(&body));
        }

        if let Some(cause) = ctx.check() {
            return Err(SoapError::Cancelled(cause));
        }

        let request = SoapRequest {
            url: self.config.endpoint().clone(),
            action: (!soap_action.is_empty()).then(|| soap_action.to_string()),
            auth: self.config.auth().cloned(),
            body,
        };

        let started = Instant::now();
        if verbose {
            info!("SOAP call {} started...", soap_action);
        }

        let reply = tokio::select! {
            biased;
            cause = ctx.done() => {
                debug!("SOAP call {} cancelled: {}", soap_action, cause);
                return Err(SoapError::Cancelled(cause));
            }
            reply = self.transport.send(request) => reply?,
        };

        if verbose {
            info!(
                "SOAP call {}... ended. Took {:?}",
                soap_action,
                started.elapsed()
            );
        }

        if reply.raw_body.is_empty() {
            debug!("empty SOAP response for {} (HTTP {})", soap_action, reply.status);
            return Ok(());
        }

        if verbose {
            info!("{}", String::from_utf8_lossy(&reply.raw_body));
        }

        match decode_body::<Resp>(&reply.raw_body)? {
            Some(SoapBody::Payload(payload)) => {
                *response = payload;
                Ok(())
            }
            Some(SoapBody::Fault(fault)) => {
                debug!(
                    "SOAP call {} returned fault {}: {}",
                    soap_action, fault.code, fault.message
                );
                Err(SoapError::Fault(fault))
            }
            None => Ok(()),
        }
    }

    /// Variante de [`call`](Self::call) qui retourne la réponse
    ///
    /// La réponse part de `Resp::default()` : une réponse vide du service
    /// produit donc la valeur par défaut.
    pub async fn invoke<Req, Resp>(
        &self,
        ctx: &CallContext,
        soap_action: &str,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: SoapPayload + Serialize,
        Resp: DeserializeOwned + Default,
    {
        let mut response = Resp::default();
        self.call(ctx, soap_action, request, Some(&mut response))
            .await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::build_soap_fault;
    use crate::transport::SoapResponse;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use std::time::Duration;

    /// Transport de test : renvoie une réponse fixe et mémorise les requêtes
    struct FakeTransport {
        reply: Vec<u8>,
        requests: Mutex<Vec<SoapRequest>>,
    }

    impl FakeTransport {
        fn new(reply: impl Into<Vec<u8>>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl SoapTransport for FakeTransport {
        async fn send(&self, request: SoapRequest) -> Result<SoapResponse> {
            self.requests.lock().push(request);
            Ok(SoapResponse {
                status: 200,
                raw_body: self.reply.clone(),
            })
        }
    }

    /// Transport qui ne répond jamais
    struct HangingTransport;

    #[async_trait]
    impl SoapTransport for HangingTransport {
        async fn send(&self, _request: SoapRequest) -> Result<SoapResponse> {
            std::future::pending().await
        }
    }

    #[derive(Debug, Serialize)]
    struct RequestTextChat {
        #[serde(rename = "custID")]
        cust_id: i64,
        #[serde(rename = "sessionKey")]
        session_key: String,
    }

    impl SoapPayload for RequestTextChat {
        const ELEMENT: &'static str = "RequestTextChat";
    }

    #[derive(Debug, Default, Clone, PartialEq, Deserialize)]
    struct RequestTextChatResponse {
        #[serde(rename = "RequestTextChatResult")]
        result: i64,
    }

    fn request() -> RequestTextChat {
        RequestTextChat {
            cust_id: 198853,
            session_key: "4145hiDT00".to_string(),
        }
    }

    fn client(transport: Arc<dyn SoapTransport>) -> SoapClient {
        let config = ClientConfig::new("http://ccmm.example.com/ws").unwrap();
        SoapClient::new(config, transport)
    }

    const CHAT_RESPONSE: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <RequestTextChatResponse><RequestTextChatResult>42</RequestTextChatResult></RequestTextChatResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[tokio::test]
    async fn test_call_populates_response() {
        let transport = FakeTransport::new(CHAT_RESPONSE);
        let client = client(transport.clone());

        let mut response = RequestTextChatResponse::default();
        client
            .call(
                &CallContext::background(),
                "urn:RequestTextChat",
                &request(),
                Some(&mut response),
            )
            .await
            .unwrap();

        assert_eq!(response.result, 42);

        let sent = transport.requests.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action.as_deref(), Some("urn:RequestTextChat"));
        assert!(sent[0].auth.is_none());
        let body = String::from_utf8(sent[0].body.clone()).unwrap();
        assert!(body.contains("<custID>198853</custID>"));
        assert!(body.contains("<sessionKey>4145hiDT00</sessionKey>"));
    }

    #[tokio::test]
    async fn test_empty_action_is_not_sent() {
        let transport = FakeTransport::new(CHAT_RESPONSE);
        let client = client(transport.clone());

        let _: RequestTextChatResponse = client
            .invoke(&CallContext::background(), "", &request())
            .await
            .unwrap();

        assert!(transport.requests.lock()[0].action.is_none());
    }

    #[tokio::test]
    async fn test_fault_leaves_response_untouched() {
        let fault = build_soap_fault("soap:Server", "Session expired", None, None).unwrap();
        let client = client(FakeTransport::new(fault));

        let mut response = RequestTextChatResponse { result: 7 };
        let err = client
            .call(&CallContext::background(), "", &request(), Some(&mut response))
            .await
            .unwrap_err();

        assert!(err.is_fault());
        assert_eq!(err.to_string(), "Session expired");
        assert_eq!(response.result, 7);
    }

    #[tokio::test]
    async fn test_empty_response_is_success() {
        let client = client(FakeTransport::new(Vec::new()));

        let mut response = RequestTextChatResponse { result: 7 };
        for _ in 0..2 {
            client
                .call(&CallContext::background(), "", &request(), Some(&mut response))
                .await
                .unwrap();
        }
        assert_eq!(response.result, 7);
    }

    #[tokio::test]
    async fn test_missing_target_skips_network() {
        let transport = FakeTransport::new(CHAT_RESPONSE);
        let client = client(transport.clone());

        let err = client
            .call::<_, RequestTextChatResponse>(&CallContext::background(), "", &request(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SoapError::ContentTarget));
        assert_eq!(transport.sent(), 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_context_skips_network() {
        let transport = FakeTransport::new(CHAT_RESPONSE);
        let client = client(transport.clone());
        let ctx = CallContext::background();
        ctx.cancel();

        let mut response = RequestTextChatResponse::default();
        let err = client
            .call(&ctx, "", &request(), Some(&mut response))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.sent(), 0);
        assert_eq!(response, RequestTextChatResponse::default());
    }

    #[tokio::test]
    async fn test_cancel_in_flight_call() {
        let client = client(Arc::new(HangingTransport));
        let ctx = CallContext::background();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let mut response = RequestTextChatResponse { result: 7 };
        let err = client
            .call(&ctx, "", &request(), Some(&mut response))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SoapError::Cancelled(crate::context::CancelCause::Cancelled)
        ));
        assert_eq!(response.result, 7);
    }

    #[tokio::test]
    async fn test_deadline_in_flight_call() {
        let client = client(Arc::new(HangingTransport));
        let ctx = CallContext::background().with_timeout(Duration::from_millis(20));

        let mut response = RequestTextChatResponse::default();
        let err = client
            .call(&ctx, "", &request(), Some(&mut response))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SoapError::Cancelled(crate::context::CancelCause::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn test_header_and_auth_from_config() {
        #[derive(Debug, Serialize)]
        struct SessionHeader {
            #[serde(rename = "sessionKey")]
            session_key: &'static str,
        }

        impl SoapPayload for SessionHeader {
            const ELEMENT: &'static str = "SessionHeader";
        }

        let transport = FakeTransport::new(CHAT_RESPONSE);
        let config = ClientConfig::new("https://ccmm.example.com/ws")
            .unwrap()
            .with_basic_auth("agent", "secret")
            .with_header(SessionHeader {
                session_key: "abc",
            })
            .verbose(true);
        let client = SoapClient::new(config, transport.clone());

        let _: RequestTextChatResponse = client
            .invoke(&CallContext::background(), "urn:x", &request())
            .await
            .unwrap();

        let sent = transport.requests.lock();
        assert_eq!(sent[0].auth.as_ref().unwrap().login, "agent");
        assert_eq!(sent[0].url.as_str(), "https://ccmm.example.com/ws");
        let body = String::from_utf8(sent[0].body.clone()).unwrap();
        assert!(body.contains("<soap:Header>"));
        assert!(body.contains("<sessionKey>abc</sessionKey>"));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_client() {
        let transport = FakeTransport::new(CHAT_RESPONSE);
        let client = client(transport.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client
                    .invoke::<_, RequestTextChatResponse>(&CallContext::background(), "", &request())
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().result, 42);
        }
        assert_eq!(transport.sent(), 8);
    }
}
