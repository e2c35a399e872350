//! XML encode/decode boundary.
//!
//! Both the appliance wire format and the persisted store format are XML
//! documents carrying `<entry>` elements. This module is the only place that
//! touches the serialization; merge logic and the normalizer only ever see
//! typed [`RawEntry`] values.

use std::io;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::types::RawEntry;

/// Collect every `<entry>` element in the document, in document order.
///
/// Unknown surrounding structure is ignored, so this reads both API job
/// payloads (`<response><result><job>…<log><logs><entry>…`) and persisted
/// store files (`<response><result><log><entry>…`).
pub fn read_entries(xml: &str) -> Result<Vec<RawEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut in_field = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if name == "entry" {
                    let log_id = start
                        .try_get_attribute("logid")?
                        .map(|attr| attr.unescape_value())
                        .transpose()?
                        .map(|value| value.into_owned())
                        .unwrap_or_default();
                    current = Some(RawEntry::new(log_id));
                } else if let Some(entry) = current.as_mut() {
                    entry.fields.push((name, String::new()));
                    in_field = true;
                }
            }
            Event::Empty(start) => {
                // Self-closing child: present but empty.
                if let Some(entry) = current.as_mut() {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    if name != "entry" {
                        entry.fields.push((name, String::new()));
                    }
                }
            }
            Event::Text(text) => {
                if in_field {
                    if let Some(entry) = current.as_mut() {
                        if let Some((_, value)) = entry.fields.last_mut() {
                            value.push_str(&text.unescape()?);
                        }
                    }
                }
            }
            Event::End(end) => {
                if end.name().as_ref() == b"entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    in_field = false;
                } else {
                    in_field = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Text of the first element with the given name, anywhere in the document.
///
/// Equivalent to an ElementTree `findtext(".//{tag}")`; used by the client
/// to pull single values (`key`, `job`, `status`, `msg`) out of envelopes.
pub fn first_text(xml: &str, tag: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_target = false;
    loop {
        match reader.read_event()? {
            Event::Start(start) if start.name().as_ref() == tag.as_bytes() => {
                in_target = true;
            }
            Event::Empty(start) if start.name().as_ref() == tag.as_bytes() => {
                return Ok(Some(String::new()));
            }
            Event::Text(text) if in_target => {
                return Ok(Some(text.unescape()?.into_owned()));
            }
            Event::End(_) if in_target => {
                // Element closed without text content.
                return Ok(Some(String::new()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// The `status` attribute of the root element, if any.
///
/// The appliance marks failures as `<response status="error">`.
pub fn root_status(xml: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(start) | Event::Empty(start) => {
                return Ok(start
                    .try_get_attribute("status")?
                    .map(|attr| attr.unescape_value())
                    .transpose()?
                    .map(|value| value.into_owned()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Write a sequence of `<entry>` elements into an open writer.
pub fn write_entries<W: io::Write>(
    writer: &mut Writer<W>,
    entries: &[RawEntry],
) -> Result<(), quick_xml::Error> {
    for entry in entries {
        let mut start = BytesStart::new("entry");
        if !entry.log_id.is_empty() {
            start.push_attribute(("logid", entry.log_id.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        for (name, value) in &entry.fields {
            writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
            if !value.is_empty() {
                writer.write_event(Event::Text(BytesText::new(value)))?;
            }
            writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        }
        writer.write_event(Event::End(BytesEnd::new("entry")))?;
    }
    Ok(())
}

/// Serialize a full store document: `<response><result><log>entries…`.
pub fn write_store_document(entries: &[RawEntry]) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("response")))?;
    writer.write_event(Event::Start(BytesStart::new("result")))?;
    writer.write_event(Event::Start(BytesStart::new("log")))?;
    write_entries(&mut writer, entries)?;
    writer.write_event(Event::End(BytesEnd::new("log")))?;
    writer.write_event(Event::End(BytesEnd::new("result")))?;
    writer.write_event(Event::End(BytesEnd::new("response")))?;
    Ok(writer.into_inner())
}
