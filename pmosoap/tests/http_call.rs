//! Appels SOAP de bout en bout contre un serveur HTTP simulé

use mockito::Matcher;
use pmosoap::{
    CallContext, ClientConfig, SoapClient, SoapError, SoapPayload, build_soap_fault,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PATH: &str = "/ccmmwebservices/CICustomerWs.asmx";
const ACTION: &str = "http://webservices.ci.ccmm.applications.nortel.com/RequestTextChat";

#[derive(Debug, Serialize)]
struct ContactWrite {
    #[serde(rename = "skillsetID")]
    skillset_id: i64,
}

#[derive(Debug, Serialize)]
struct RequestTextChat {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "custID")]
    cust_id: i64,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "newContact")]
    new_contact: ContactWrite,
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
        xmlns: "http://webservices.ci.ccmm.applications.nortel.com",
        cust_id: 198853,
        session_key: "4145hiDT00".to_string(),
        new_contact: ContactWrite { skillset_id: 11 },
    }
}

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>{}</soap:Body>
</soap:Envelope>"#,
        body
    )
}

fn client(server: &mockito::Server) -> SoapClient {
    let config = ClientConfig::new(&format!("{}{}", server.url(), PATH)).unwrap();
    SoapClient::with_http(config).unwrap()
}

#[tokio::test]
async fn request_text_chat_returns_contact_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("content-type", r#"text/xml; charset="utf-8""#)
        .match_header("soapaction", ACTION)
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<custID>198853</custID>".to_string()),
            Matcher::Regex("<sessionKey>4145hiDT00</sessionKey>".to_string()),
            Matcher::Regex("<skillsetID>11</skillsetID>".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(envelope(
            "<RequestTextChatResponse xmlns=\"http://webservices.ci.ccmm.applications.nortel.com\"><RequestTextChatResult>42</RequestTextChatResult></RequestTextChatResponse>",
        ))
        .create_async()
        .await;

    let mut response = RequestTextChatResponse::default();
    client(&server)
        .call(&CallContext::background(), ACTION, &request(), Some(&mut response))
        .await
        .unwrap();

    assert_eq!(response.result, 42);
    mock.assert_async().await;
}

#[tokio::test]
async fn basic_auth_and_missing_action() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", "Basic YWdlbnQ6c2VjcmV0")
        .match_header("soapaction", Matcher::Missing)
        .with_status(200)
        .with_body(envelope(
            "<RequestTextChatResponse><RequestTextChatResult>1</RequestTextChatResult></RequestTextChatResponse>",
        ))
        .create_async()
        .await;

    let config = ClientConfig::new(&format!("{}{}", server.url(), PATH))
        .unwrap()
        .with_basic_auth("agent", "secret");
    let client = SoapClient::with_http(config).unwrap();

    let response: RequestTextChatResponse = client
        .invoke(&CallContext::background(), "", &request())
        .await
        .unwrap();

    assert_eq!(response.result, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn fault_with_http_500_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let fault = build_soap_fault("soap:Server", "Session expired", None, None).unwrap();
    let _mock = server
        .mock("POST", PATH)
        .with_status(500)
        .with_body(fault)
        .create_async()
        .await;

    let mut response = RequestTextChatResponse { result: 3 };
    let err = client(&server)
        .call(&CallContext::background(), ACTION, &request(), Some(&mut response))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Session expired");
    assert_eq!(err.fault().unwrap().code, "soap:Server");
    assert_eq!(response.result, 3);
}

#[tokio::test]
async fn empty_response_leaves_target_untouched() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(202)
        .expect(2)
        .create_async()
        .await;

    let client = client(&server);
    let mut response = RequestTextChatResponse { result: 5 };
    for _ in 0..2 {
        client
            .call(&CallContext::background(), ACTION, &request(), Some(&mut response))
            .await
            .unwrap();
    }

    assert_eq!(response.result, 5);
}

#[tokio::test]
async fn multiple_body_elements_are_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(envelope("<A/><B/>"))
        .create_async()
        .await;

    let mut response = RequestTextChatResponse::default();
    let err = client(&server)
        .call(&CallContext::background(), ACTION, &request(), Some(&mut response))
        .await
        .unwrap_err();

    assert!(matches!(err, SoapError::ProtocolViolation));
}

#[tokio::test]
async fn missing_target_does_not_reach_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .expect(0)
        .create_async()
        .await;

    let err = client(&server)
        .call::<_, RequestTextChatResponse>(&CallContext::background(), ACTION, &request(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SoapError::ContentTarget));
    mock.assert_async().await;
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:1/ws").unwrap();
    let client = SoapClient::with_http(config).unwrap();

    let mut response = RequestTextChatResponse::default();
    let err = client
        .call(
            &CallContext::background().with_timeout(Duration::from_secs(10)),
            ACTION,
            &request(),
            Some(&mut response),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SoapError::Transport(_)), "got {:?}", err);
}
