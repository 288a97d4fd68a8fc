//! Documents échangés avec les services CCMM
//!
//! Les requêtes portent le namespace des web services en namespace par
//! défaut ; les types de données imbriqués (`newContact`, `lastReadTime`…)
//! appartiennent au namespace des datatypes, déclaré avec le préfixe `dt`.
//! Les réponses sont décodées sur les noms locaux.

use chrono::{DateTime, TimeZone, Utc};
use pmosoap::SoapPayload;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Namespace des web services CCMM
pub const WS_NS: &str = "http://webservices.ci.ccmm.applications.nortel.com";

/// Namespace des types de données CCMM
pub const DATATYPES_NS: &str = "http://datatypes.ci.ccmm.applications.nortel.com";

macro_rules! soap_payload {
    ($($ty:ident),* $(,)?) => {
        $(
            impl SoapPayload for $ty {
                const ELEMENT: &'static str = stringify!($ty);
            }
        )*
    };
}

// ============= Types de données =============

/// Horodatage CCMM, en millisecondes depuis l'epoch Unix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CIDateTime {
    #[serde(default)]
    pub milliseconds: i64,
}

impl CIDateTime {
    pub fn from_millis(milliseconds: i64) -> Self {
        Self { milliseconds }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::from_millis(datetime.timestamp_millis())
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.milliseconds).single()
    }
}

/// Type d'un message de chat
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChatMessageType {
    #[default]
    ChatMessageFromCustomer,
    ChatMessageFromAgent,
    SessionDisconnectedByCustomer,
    SessionDisconnectedByAgent,
    /// Valeur non répertoriée renvoyée par le serveur
    Other(String),
}

impl ChatMessageType {
    pub fn as_str(&self) -> &str {
        match self {
            ChatMessageType::ChatMessageFromCustomer => "Chat_Message_from_Customer",
            ChatMessageType::ChatMessageFromAgent => "Chat_Message_from_Agent",
            ChatMessageType::SessionDisconnectedByCustomer => "Session_Disconnected_by_Customer",
            ChatMessageType::SessionDisconnectedByAgent => "Session_Disconnected_by_Agent",
            ChatMessageType::Other(value) => value,
        }
    }

    pub fn from_wire(value: &str) -> Self {
        match value {
            "Chat_Message_from_Customer" => ChatMessageType::ChatMessageFromCustomer,
            "Chat_Message_from_Agent" => ChatMessageType::ChatMessageFromAgent,
            "Session_Disconnected_by_Customer" => ChatMessageType::SessionDisconnectedByCustomer,
            "Session_Disconnected_by_Agent" => ChatMessageType::SessionDisconnectedByAgent,
            other => ChatMessageType::Other(other.to_string()),
        }
    }

    /// Vérifie si le message clôt la session
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            ChatMessageType::SessionDisconnectedByCustomer
                | ChatMessageType::SessionDisconnectedByAgent
        )
    }
}

impl Serialize for ChatMessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChatMessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(ChatMessageType::from_wire(value.trim()))
    }
}

/// Skillset (file d'attente) du centre de contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Skillset {
    pub id: i64,
    pub name: String,
}

/// Session anonyme ouverte par `GetAnonymousSessionKey`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousSession {
    pub session_key: String,
    pub anonymous_id: i64,
}

/// Message de chat lu sur un contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    #[serde(rename = "chatMessage")]
    pub message: String,

    #[serde(rename = "chatMessageType")]
    pub message_type: ChatMessageType,

    #[serde(rename = "writeTime")]
    pub write_time: CIDateTime,

    #[serde(rename = "nickname")]
    pub nickname: Option<String>,
}

/// Messages lus sur un contact et état de saisie de l'agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatMessages {
    #[serde(rename = "listOfChatMessages")]
    pub list: ChatMessageList,

    #[serde(rename = "isWriting")]
    pub is_writing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatMessageList {
    #[serde(rename = "CIChatMessageReadType")]
    pub messages: Vec<ChatMessage>,
}

impl ChatMessages {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.list.messages
    }

    /// Horodatage du message le plus récent
    pub fn last_write_time(&self) -> Option<CIDateTime> {
        self.list.messages.iter().map(|m| m.write_time).max()
    }
}

// ============= CIUtilityWs =============

#[derive(Debug, Serialize)]
pub(crate) struct GetAnonymousSessionKey {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
}

impl GetAnonymousSessionKey {
    pub(crate) fn new() -> Self {
        Self { xmlns: WS_NS }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GetAnonymousSessionKeyResponse {
    #[serde(rename = "GetAnonymousSessionKeyResult")]
    pub(crate) result: AnonymousLoginResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AnonymousLoginResult {
    #[serde(rename = "sessionKey")]
    pub(crate) session_key: String,
    #[serde(rename = "anonymousID")]
    pub(crate) anonymous_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetAndUpdateAnonymousCustomerID {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:dt")]
    xmlns_dt: &'static str,
    #[serde(rename = "loginResult")]
    login_result: LoginResultWrite,
    #[serde(rename = "emailAddress")]
    email_address: String,
    #[serde(rename = "thisCustomer")]
    this_customer: CustomerWrite,
}

#[derive(Debug, Serialize)]
struct LoginResultWrite {
    #[serde(rename = "dt:anonymousID")]
    anonymous_id: i64,
    #[serde(rename = "dt:sessionKey")]
    session_key: String,
}

#[derive(Debug, Serialize)]
struct CustomerWrite {
    #[serde(rename = "dt:addressList")]
    address_list: AddressList,
}

#[derive(Debug, Serialize)]
struct AddressList {
    #[serde(rename = "dt:CIAddressReadType")]
    addresses: Vec<AddressRead>,
}

#[derive(Debug, Serialize)]
struct AddressRead {}

impl GetAndUpdateAnonymousCustomerID {
    pub(crate) fn new(session_key: &str, anonymous_id: i64, email: &str) -> Self {
        Self {
            xmlns: WS_NS,
            xmlns_dt: DATATYPES_NS,
            login_result: LoginResultWrite {
                anonymous_id,
                session_key: session_key.to_string(),
            },
            email_address: email.to_string(),
            // Le service attend une adresse, même vide
            this_customer: CustomerWrite {
                address_list: AddressList {
                    addresses: vec![AddressRead {}],
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GetAndUpdateAnonymousCustomerIDResponse {
    #[serde(rename = "GetAndUpdateAnonymousCustomerIDResult")]
    pub(crate) result: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CustomerLogoffByContactID {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "contactID")]
    contact_id: i64,
}

impl CustomerLogoffByContactID {
    pub(crate) fn new(session_key: &str, contact_id: i64) -> Self {
        Self {
            xmlns: WS_NS,
            session_key: session_key.to_string(),
            contact_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CustomerLogoffByContactIDResponse {}

// ============= CISkillsetWs =============

#[derive(Debug, Serialize)]
pub(crate) struct IsSkillsetNameInService {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "skillsetName")]
    skillset_name: String,
}

impl IsSkillsetNameInService {
    pub(crate) fn new(skillset_name: &str) -> Self {
        Self {
            xmlns: WS_NS,
            skillset_name: skillset_name.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IsSkillsetNameInServiceResponse {
    #[serde(rename = "IsSkillsetNameInServiceResult")]
    pub(crate) result: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetSkillsetByName {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "skillsetName")]
    skillset_name: String,
}

impl GetSkillsetByName {
    pub(crate) fn new(session_key: &str, skillset_name: &str) -> Self {
        Self {
            xmlns: WS_NS,
            session_key: session_key.to_string(),
            skillset_name: skillset_name.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GetSkillsetByNameResponse {
    #[serde(rename = "GetSkillsetByNameResult")]
    pub(crate) result: Skillset,
}

// ============= CICustomerWs =============

#[derive(Debug, Serialize)]
pub(crate) struct RequestTextChat {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:dt")]
    xmlns_dt: &'static str,
    #[serde(rename = "custID")]
    cust_id: i64,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "newContact")]
    new_contact: ContactWrite,
}

#[derive(Debug, Serialize)]
struct ContactWrite {
    #[serde(rename = "dt:skillsetID")]
    skillset_id: i64,
}

impl RequestTextChat {
    pub(crate) fn new(customer_id: i64, session_key: &str, skillset_id: i64) -> Self {
        Self {
            xmlns: WS_NS,
            xmlns_dt: DATATYPES_NS,
            cust_id: customer_id,
            session_key: session_key.to_string(),
            new_contact: ContactWrite { skillset_id },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RequestTextChatResponse {
    #[serde(rename = "RequestTextChatResult")]
    pub(crate) result: i64,
}

// ============= CIWebCommsWs =============

#[derive(Debug, Serialize)]
pub(crate) struct UpdateAliveTimeAndUpdateIsTyping {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "contactID")]
    contact_id: i64,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "isTyping")]
    is_typing: bool,
}

impl UpdateAliveTimeAndUpdateIsTyping {
    pub(crate) fn new(session_key: &str, contact_id: i64, is_typing: bool) -> Self {
        Self {
            xmlns: WS_NS,
            contact_id,
            session_key: session_key.to_string(),
            is_typing,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpdateAliveTimeAndUpdateIsTypingResponse {}

#[derive(Debug, Serialize)]
pub(crate) struct ReadChatMessage {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:dt")]
    xmlns_dt: &'static str,
    #[serde(rename = "contactID")]
    contact_id: i64,
    #[serde(rename = "isWriting")]
    is_writing: bool,
    #[serde(rename = "lastReadTime")]
    last_read_time: DateTimeWrite,
    #[serde(rename = "sessionKey")]
    session_key: String,
}

#[derive(Debug, Serialize)]
struct DateTimeWrite {
    #[serde(rename = "dt:milliseconds")]
    milliseconds: i64,
}

impl ReadChatMessage {
    pub(crate) fn new(
        session_key: &str,
        contact_id: i64,
        is_writing: bool,
        last_read_time: CIDateTime,
    ) -> Self {
        Self {
            xmlns: WS_NS,
            xmlns_dt: DATATYPES_NS,
            contact_id,
            is_writing,
            last_read_time: DateTimeWrite {
                milliseconds: last_read_time.milliseconds,
            },
            session_key: session_key.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReadChatMessageResponse {
    #[serde(rename = "ReadChatMessageResult")]
    pub(crate) result: ChatMessages,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteChatMessage {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "contactID")]
    contact_id: i64,
    #[serde(rename = "message")]
    message: String,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "chatMessageType")]
    chat_message_type: ChatMessageType,
}

impl WriteChatMessage {
    pub(crate) fn new(
        session_key: &str,
        contact_id: i64,
        message: &str,
        chat_message_type: ChatMessageType,
    ) -> Self {
        Self {
            xmlns: WS_NS,
            contact_id,
            message: message.to_string(),
            session_key: session_key.to_string(),
            chat_message_type,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WriteChatMessageResponse {
    #[serde(rename = "WriteChatMessageResult")]
    pub(crate) result: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AbandonQueuingWebCommsContact {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "contactID")]
    contact_id: i64,
    #[serde(rename = "closureComment")]
    closure_comment: String,
}

impl AbandonQueuingWebCommsContact {
    pub(crate) fn new(session_key: &str, contact_id: i64, closure_comment: &str) -> Self {
        Self {
            xmlns: WS_NS,
            session_key: session_key.to_string(),
            contact_id,
            closure_comment: closure_comment.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AbandonQueuingWebCommsContactResponse {}

soap_payload!(
    GetAnonymousSessionKey,
    GetAndUpdateAnonymousCustomerID,
    CustomerLogoffByContactID,
    IsSkillsetNameInService,
    GetSkillsetByName,
    RequestTextChat,
    UpdateAliveTimeAndUpdateIsTyping,
    ReadChatMessage,
    WriteChatMessage,
    AbandonQueuingWebCommsContact,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_type_wire_names() {
        for kind in [
            ChatMessageType::ChatMessageFromCustomer,
            ChatMessageType::ChatMessageFromAgent,
            ChatMessageType::SessionDisconnectedByCustomer,
            ChatMessageType::SessionDisconnectedByAgent,
        ] {
            assert_eq!(ChatMessageType::from_wire(kind.as_str()), kind);
        }

        let other = ChatMessageType::from_wire("Push_URL");
        assert_eq!(other, ChatMessageType::Other("Push_URL".to_string()));
        assert_eq!(other.as_str(), "Push_URL");
        assert!(!other.is_disconnect());
        assert!(ChatMessageType::SessionDisconnectedByAgent.is_disconnect());
    }

    #[test]
    fn test_ci_date_time_conversion() {
        let datetime = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let ci = CIDateTime::from_datetime(datetime);
        assert_eq!(ci.milliseconds, 1_709_294_400_000);
        assert_eq!(ci.to_datetime(), Some(datetime));
    }

    #[test]
    fn test_last_write_time() {
        let mut messages = ChatMessages::default();
        assert_eq!(messages.last_write_time(), None);

        for ms in [30, 10, 20] {
            messages.list.messages.push(ChatMessage {
                write_time: CIDateTime::from_millis(ms),
                ..Default::default()
            });
        }
        assert_eq!(messages.last_write_time(), Some(CIDateTime::from_millis(30)));
    }

    #[test]
    fn test_payload_element_names() {
        assert_eq!(RequestTextChat::ELEMENT, "RequestTextChat");
        assert_eq!(
            GetAndUpdateAnonymousCustomerID::ELEMENT,
            "GetAndUpdateAnonymousCustomerID"
        );
    }
}
