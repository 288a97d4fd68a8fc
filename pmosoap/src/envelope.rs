//! Structures de l'enveloppe SOAP et règles de (dé)sérialisation
//!
//! L'enveloppe sortante est écrite avec un [`quick_xml::Writer`] indenté ;
//! le contenu métier (requête ou header) est sérialisé via `serde` sous le
//! nom d'élément fourni par [`SoapPayload`]. Côté réponse, [`decode_body`]
//! parcourt l'enveloppe jusqu'au `Body` puis délègue au résolveur.

use crate::error::{Result, SoapError};
use crate::fault::SoapFault;
use crate::resolver::BodyResolver;
use crate::{SOAP_ENV_NS, SOAP_ENV_PREFIX};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::se::SeError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// Document métier transportable dans un Body ou un Header SOAP
///
/// Le nom d'élément est fourni par la couche de schéma (un type par
/// opération). Il peut être préfixé (`tns:RequestTextChat`) si le type
/// déclare lui-même le namespace correspondant via un attribut `@xmlns:tns`.
pub trait SoapPayload {
    /// Nom de l'élément XML qui enveloppe le document
    const ELEMENT: &'static str;
}

impl<T: SoapPayload + ?Sized> SoapPayload for &T {
    const ELEMENT: &'static str = T::ELEMENT;
}

type HeaderWriter = dyn Fn(&mut Writer<Vec<u8>>) -> std::result::Result<(), SeError> + Send + Sync;

/// En-tête SOAP attaché à chaque appel d'un client
///
/// Construit une fois à partir d'une valeur typée, puis partagé entre les
/// appels concurrents.
#[derive(Clone)]
pub struct SoapHeader {
    element: &'static str,
    writer: Arc<HeaderWriter>,
}

impl SoapHeader {
    pub fn new<H>(value: H) -> Self
    where
        H: SoapPayload + Serialize + Send + Sync + 'static,
    {
        Self {
            element: H::ELEMENT,
            writer: Arc::new(move |writer| writer.write_serializable(H::ELEMENT, &value)),
        }
    }

    /// Nom de l'élément porté par l'en-tête
    pub fn element(&self) -> &str {
        self.element
    }

    fn write_xml(&self, writer: &mut Writer<Vec<u8>>) -> std::result::Result<(), SeError> {
        (self.writer)(writer)
    }
}

impl fmt::Debug for SoapHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoapHeader")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

/// Corps SOAP : soit un Fault, soit le document métier
#[derive(Debug, Clone, PartialEq)]
pub enum SoapBody<T> {
    Fault(SoapFault),
    Payload(T),
}

impl<T> SoapBody<T> {
    pub fn is_fault(&self) -> bool {
        matches!(self, SoapBody::Fault(_))
    }

    /// Convertit le corps en résultat : un Fault devient une erreur
    pub fn into_result(self) -> Result<T> {
        match self {
            SoapBody::Fault(fault) => Err(SoapError::Fault(fault)),
            SoapBody::Payload(payload) => Ok(payload),
        }
    }
}

/// Enveloppe SOAP complète
#[derive(Debug, Clone)]
pub struct SoapEnvelope<'a, T> {
    /// En-tête SOAP optionnel
    pub header: Option<&'a SoapHeader>,

    /// Corps SOAP contenant la requête ou le fault
    pub body: SoapBody<T>,
}

impl<'a, T> SoapEnvelope<'a, T> {
    /// Crée une nouvelle enveloppe contenant un document
    pub fn new(payload: T) -> Self {
        Self {
            header: None,
            body: SoapBody::Payload(payload),
        }
    }

    /// Crée une nouvelle enveloppe avec header optionnel
    pub fn with_header(header: Option<&'a SoapHeader>, payload: T) -> Self {
        Self {
            header,
            body: SoapBody::Payload(payload),
        }
    }
}

impl<T> SoapEnvelope<'_, T>
where
    T: SoapPayload + Serialize,
{
    /// Sérialise l'enveloppe en XML indenté, prêt à être transmis
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let buf = write_envelope(self.header, |writer| match &self.body {
            SoapBody::Fault(fault) => fault.write_xml(writer),
            SoapBody::Payload(payload) => writer.write_serializable(T::ELEMENT, payload),
        })?;
        Ok(buf)
    }
}

pub(crate) fn write_error<E: fmt::Display>(err: E) -> SeError {
    <SeError as serde::ser::Error>::custom(err)
}

/// Écrit `<soap:Envelope>[<soap:Header>…</soap:Header>]<soap:Body>…</soap:Body></soap:Envelope>`
pub(crate) fn write_envelope<F>(
    header: Option<&SoapHeader>,
    body: F,
) -> std::result::Result<Vec<u8>, SeError>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> std::result::Result<(), SeError>,
{
    let envelope = format!("{}:Envelope", SOAP_ENV_PREFIX);
    let header_tag = format!("{}:Header", SOAP_ENV_PREFIX);
    let body_tag = format!("{}:Body", SOAP_ENV_PREFIX);
    let xmlns = format!("xmlns:{}", SOAP_ENV_PREFIX);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new(envelope.as_str()).with_attributes([(xmlns.as_str(), SOAP_ENV_NS)]),
        ))
        .map_err(write_error)?;

    if let Some(header) = header {
        writer
            .write_event(Event::Start(BytesStart::new(header_tag.as_str())))
            .map_err(write_error)?;
        header.write_xml(&mut writer)?;
        writer
            .write_event(Event::End(BytesEnd::new(header_tag.as_str())))
            .map_err(write_error)?;
    }

    writer
        .write_event(Event::Start(BytesStart::new(body_tag.as_str())))
        .map_err(write_error)?;
    body(&mut writer)?;
    writer
        .write_event(Event::End(BytesEnd::new(body_tag.as_str())))
        .map_err(write_error)?;

    writer
        .write_event(Event::End(BytesEnd::new(envelope.as_str())))
        .map_err(write_error)?;

    Ok(writer.into_inner())
}

pub(crate) fn is_soap_element(ns: &ResolveResult, local_name: &[u8], expected: &str) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SOAP_ENV_NS.as_bytes())
        && local_name == expected.as_bytes()
}

/// Décode une réponse SOAP brute
///
/// Retourne `None` si la réponse est vide ou si le `Body` ne contient aucun
/// élément ; sinon le Fault ou le document décodé dans le type `R`.
pub fn decode_body<R>(raw: &[u8]) -> Result<Option<SoapBody<R>>>
where
    R: DeserializeOwned,
{
    if raw.is_empty() {
        return Ok(None);
    }

    let xml = std::str::from_utf8(raw)
        .map_err(|e| SoapError::malformed(format!("response is not valid UTF-8: {}", e)))?;
    // Le reader ne compte pas le BOM dans ses positions
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Élément racine : Envelope
    loop {
        let (is_envelope, event) = {
            let (ns, event) = reader.read_resolved_event()?;
            let is_envelope = match &event {
                Event::Start(e) | Event::Empty(e) => {
                    is_soap_element(&ns, e.local_name().as_ref(), "Envelope")
                }
                _ => false,
            };
            (is_envelope, event)
        };

        match event {
            Event::Start(_) if is_envelope => break,
            Event::Empty(_) if is_envelope => {
                return Err(SoapError::malformed("Missing SOAP Body"));
            }
            Event::Start(e) | Event::Empty(e) => {
                return Err(SoapError::malformed(format!(
                    "expected SOAP Envelope, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Event::Eof => return Err(SoapError::malformed("Missing SOAP Envelope")),
            _ => {}
        }
    }

    // Enfants de l'Envelope : Header ignoré, Body résolu
    loop {
        let (is_body, event) = {
            let (ns, event) = reader.read_resolved_event()?;
            let is_body = match &event {
                Event::Start(e) | Event::Empty(e) => {
                    is_soap_element(&ns, e.local_name().as_ref(), "Body")
                }
                _ => false,
            };
            (is_body, event)
        };

        match event {
            Event::Start(_) if is_body => {
                return BodyResolver::new(&mut reader, xml).resolve();
            }
            Event::Empty(_) if is_body => return Ok(None),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) | Event::Eof => return Err(SoapError::malformed("Missing SOAP Body")),
            _ => {}
        }
    }
}
