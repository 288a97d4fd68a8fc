//! Résolution du contenu du Body SOAP
//!
//! Le Body d'une réponse contient un seul élément dont la nature n'est connue
//! qu'à la lecture : un `Fault` dans le namespace de l'enveloppe, ou le
//! document attendu par l'appelant. Le résolveur lit les enfants du Body en
//! un seul passage, classe le premier élément d'après son nom qualifié et
//! refuse tout second élément. Le décodage typé n'a lieu qu'une fois la
//! balise fermante du Body atteinte.

use crate::envelope::{SoapBody, is_soap_element};
use crate::error::{Result, SoapError};
use crate::fault::SoapFault;
use quick_xml::events::Event;
use quick_xml::reader::NsReader;
use serde::de::DeserializeOwned;
use tracing::debug;

/// État du Body au fil de la lecture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState<'i> {
    Empty,
    Fault(&'i str),
    Payload(&'i str),
}

pub(crate) struct BodyResolver<'r, 'i> {
    reader: &'r mut NsReader<&'i [u8]>,
    xml: &'i str,
    state: BodyState<'i>,
}

impl<'r, 'i> BodyResolver<'r, 'i> {
    /// `reader` doit être positionné juste après la balise ouvrante du Body
    pub(crate) fn new(reader: &'r mut NsReader<&'i [u8]>, xml: &'i str) -> Self {
        Self {
            reader,
            xml,
            state: BodyState::Empty,
        }
    }

    pub(crate) fn resolve<R>(mut self) -> Result<Option<SoapBody<R>>>
    where
        R: DeserializeOwned,
    {
        loop {
            let start = self.reader.buffer_position() as usize;
            let (is_fault, event) = {
                let (ns, event) = self.reader.read_resolved_event()?;
                let is_fault = match &event {
                    Event::Start(e) | Event::Empty(e) => {
                        is_soap_element(&ns, e.local_name().as_ref(), "Fault")
                    }
                    _ => false,
                };
                (is_fault, event)
            };

            match event {
                Event::Start(e) => {
                    self.reader.read_to_end(e.name())?;
                    let end = self.reader.buffer_position() as usize;
                    self.consume(is_fault, start, end)?;
                }
                Event::Empty(_) => {
                    let end = self.reader.buffer_position() as usize;
                    self.consume(is_fault, start, end)?;
                }
                Event::End(_) => break,
                Event::Eof => return Err(SoapError::malformed("unexpected end of SOAP Body")),
                _ => {}
            }
        }

        match self.state {
            BodyState::Empty => {
                debug!("SOAP body has no content");
                Ok(None)
            }
            BodyState::Fault(xml) => Ok(Some(SoapBody::Fault(SoapFault::from_xml(xml)?))),
            BodyState::Payload(xml) => Ok(Some(SoapBody::Payload(quick_xml::de::from_str(xml)?))),
        }
    }

    fn consume(&mut self, is_fault: bool, start: usize, end: usize) -> Result<()> {
        if self.state != BodyState::Empty {
            return Err(SoapError::ProtocolViolation);
        }

        let fragment = self
            .xml
            .get(start..end)
            .ok_or_else(|| SoapError::malformed("SOAP body element out of bounds"))?
            .trim_start();
        self.state = if is_fault {
            BodyState::Fault(fragment)
        } else {
            BodyState::Payload(fragment)
        };
        Ok(())
    }
}
