//! SOAP Faults

use crate::SOAP_ENV_PREFIX;
use crate::envelope::{write_envelope, write_error};
use crate::error::{Result, SoapError};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use quick_xml::se::SeError;
use thiserror::Error;

/// Erreur SOAP (Fault) renvoyée par le service
///
/// Le message affiché est le `faultstring`, c'est-à-dire le texte lisible
/// fourni par le service.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{message}")]
pub struct SoapFault {
    /// Code du fault (ex: "soap:Client", "soap:Server")
    pub code: String,

    /// Description de l'erreur (`faultstring`)
    pub message: String,

    /// Acteur à l'origine du fault (`faultactor`)
    pub actor: Option<String>,

    /// Contenu XML brut de l'élément `detail`
    pub detail: Option<String>,
}

impl SoapFault {
    /// Crée un fault SOAP simple
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            actor: None,
            detail: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Ajoute un détail ; le contenu est écrit tel quel (XML déjà échappé)
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Décode un élément `Fault` complet (balise ouvrante comprise)
    pub(crate) fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut fault = SoapFault::default();
        let mut inside = false;

        loop {
            match reader.read_event()? {
                Event::Start(_) if !inside => inside = true,
                Event::Empty(_) if !inside => break,
                Event::Start(e) => match e.local_name().as_ref() {
                    b"faultcode" => fault.code = read_field(&mut reader, e.name())?,
                    b"faultstring" => fault.message = read_field(&mut reader, e.name())?,
                    b"faultactor" => fault.actor = Some(read_field(&mut reader, e.name())?),
                    b"detail" => fault.detail = Some(read_inner_xml(&mut reader, xml, e.name())?),
                    _ => {
                        reader.read_to_end(e.name())?;
                    }
                },
                Event::Empty(e) if e.local_name().as_ref() == b"detail" => {
                    fault.detail = Some(String::new());
                }
                Event::End(_) => break,
                Event::Eof => return Err(SoapError::malformed("unexpected end of SOAP Fault")),
                _ => {}
            }
        }

        Ok(fault)
    }

    pub(crate) fn write_xml(&self, writer: &mut Writer<Vec<u8>>) -> std::result::Result<(), SeError> {
        let fault = format!("{}:Fault", SOAP_ENV_PREFIX);
        writer
            .write_event(Event::Start(BytesStart::new(fault.as_str())))
            .map_err(write_error)?;

        write_text_element(writer, "faultcode", &self.code)?;
        write_text_element(writer, "faultstring", &self.message)?;
        if let Some(actor) = &self.actor {
            write_text_element(writer, "faultactor", actor)?;
        }
        if let Some(detail) = &self.detail {
            writer
                .write_event(Event::Start(BytesStart::new("detail")))
                .map_err(write_error)?;
            writer
                .write_event(Event::Text(BytesText::from_escaped(detail.as_str())))
                .map_err(write_error)?;
            writer
                .write_event(Event::End(BytesEnd::new("detail")))
                .map_err(write_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(fault.as_str())))
            .map_err(write_error)
    }
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> std::result::Result<(), SeError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(write_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)
}

fn read_field(reader: &mut Reader<&[u8]>, name: QName) -> Result<String> {
    let raw = reader.read_text(name)?;
    let text = quick_xml::escape::unescape(&raw)
        .map_err(|e| SoapError::malformed(format!("invalid escape in SOAP Fault: {}", e)))?;
    Ok(text.trim().to_string())
}

fn read_inner_xml(reader: &mut Reader<&[u8]>, xml: &str, name: QName) -> Result<String> {
    let start = reader.buffer_position() as usize;
    reader.read_to_end(name)?;
    let end = reader.buffer_position() as usize;

    // La plage lue inclut la balise fermante
    let inner = &xml[start..end];
    let inner = inner.rfind("</").map_or(inner, |pos| &inner[..pos]);
    Ok(inner.trim().to_string())
}

/// Construit une enveloppe SOAP 1.1 contenant un Fault
///
/// # Arguments
///
/// * `code` - Code du fault (ex: "soap:Client")
/// * `message` - Message d'erreur (`faultstring`)
/// * `actor` - Acteur optionnel (`faultactor`)
/// * `detail` - Détail optionnel, inséré tel quel dans `<detail>`
///
/// # Returns
///
/// XML SOAP Fault formaté
pub fn build_soap_fault(
    code: &str,
    message: &str,
    actor: Option<&str>,
    detail: Option<&str>,
) -> Result<String> {
    let mut fault = SoapFault::new(code, message);
    fault.actor = actor.map(str::to_string);
    fault.detail = detail.map(str::to_string);

    let buf = write_envelope(None, |writer| fault.write_xml(writer))?;
    Ok(String::from_utf8(buf).map_err(write_error)?)
}
