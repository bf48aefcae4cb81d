//! `207 Multi-Status` bodies returned by `PROPFIND`.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use svngate_core::BackendError;

/// Request body asking only for the properties the gateway reads.
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
    <D:creationdate/>
    <D:version-name/>
  </D:prop>
</D:propfind>
"#;

/// Properties of one `<D:response>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropEntry {
    pub href: String,
    pub collection: bool,
    pub creation_date: Option<String>,
    pub version_name: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Href,
    CreationDate,
    VersionName,
}

fn field_for(local_name: &[u8]) -> Option<Field> {
    match local_name {
        b"href" => Some(Field::Href),
        b"creationdate" => Some(Field::CreationDate),
        b"version-name" => Some(Field::VersionName),
        _ => None,
    }
}

fn xml_err(e: impl std::fmt::Display) -> BackendError {
    BackendError::Protocol(format!("malformed multistatus body: {e}"))
}

/// Parse a multistatus document into one entry per `<response>`, in
/// document order. Namespace prefixes are ignored.
pub fn parse(xml: &str) -> Result<Vec<PropEntry>, BackendError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PropEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_resourcetype = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"response" => current = Some(PropEntry::default()),
                b"resourcetype" => in_resourcetype = true,
                b"collection" if in_resourcetype => {
                    if let Some(entry) = current.as_mut() {
                        entry.collection = true;
                    }
                }
                name => field = field_for(name),
            },
            Event::Empty(e) => {
                if in_resourcetype && e.local_name().as_ref() == b"collection" {
                    if let Some(entry) = current.as_mut() {
                        entry.collection = true;
                    }
                }
            }
            Event::Text(text) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    let value = text.unescape().map_err(xml_err)?.into_owned();
                    match f {
                        Field::Href => entry.href.push_str(&value),
                        Field::CreationDate => entry.creation_date = Some(value),
                        Field::VersionName => entry.version_name = Some(value),
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"response" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                b"resourcetype" => in_resourcetype = false,
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}
