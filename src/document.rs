//! Extraction of the two structures the resolver needs from ENA XML records:
//! sample cross-references of a project and pool members of an experiment.

use std::fmt::Display;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

use crate::domain::{DocumentKind, MembershipEntry};
use crate::error::ResolverError;

const XREF_LINK_PATH: &[&[u8]] = &[b"PROJECT_LINKS", b"PROJECT_LINK", b"XREF_LINK"];
const POOL_PATH: &[&[u8]] = &[b"EXPERIMENT", b"DESIGN", b"SAMPLE_DESCRIPTOR", b"POOL"];
const MEMBER: &[u8] = b"MEMBER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XrefField {
    Db,
    Id,
}

#[derive(Debug, Default)]
struct XrefLink {
    depth: usize,
    db: String,
    ids: Vec<String>,
}

impl XrefLink {
    fn push_text(&mut self, field: XrefField, text: &str) {
        match field {
            XrefField::Db => self.db.push_str(text),
            XrefField::Id => {
                if let Some(id) = self.ids.last_mut() {
                    id.push_str(text);
                }
            }
        }
    }
}

/// Returns the `ID` text of every `XREF_LINK` whose `DB` equals `sample_db`,
/// in document order. A link carrying several `ID` elements contributes each
/// of them.
pub fn parse_sample_links(
    project_id: &str,
    xml: &[u8],
    sample_db: &str,
) -> Result<Vec<String>, ResolverError> {
    let kind = DocumentKind::Project;
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<XrefLink> = None;
    let mut field: Option<XrefField> = None;
    let mut links = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(e.name().as_ref().to_vec());
                if ends_with(&stack, XREF_LINK_PATH) {
                    current = Some(XrefLink {
                        depth: stack.len(),
                        ..XrefLink::default()
                    });
                } else if let Some(link) = current.as_mut() {
                    if stack.len() == link.depth + 1 {
                        field = match e.name().as_ref() {
                            b"DB" => Some(XrefField::Db),
                            b"ID" => {
                                link.ids.push(String::new());
                                Some(XrefField::Id)
                            }
                            _ => None,
                        };
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(link) = current.as_mut() {
                    if stack.len() == link.depth && e.name().as_ref() == b"ID" {
                        link.ids.push(String::new());
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(link), Some(field)) = (current.as_mut(), field) {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    let text = unescape_text(kind, project_id, &raw)?;
                    link.push_text(field, &text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(link), Some(field)) = (current.as_mut(), field) {
                    link.push_text(field, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let (Some(link), Some(field)) = (current.as_mut(), field) {
                    let entity = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                    let text = unescape_text(kind, project_id, &entity)?;
                    link.push_text(field, &text);
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                field = None;
                if current
                    .as_ref()
                    .map(|link| stack.len() < link.depth)
                    .unwrap_or(false)
                {
                    if let Some(link) = current.take() {
                        if link.db.trim() == sample_db {
                            links.extend(link.ids.iter().map(|id| id.trim().to_string()));
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(kind, project_id, err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(links)
}

/// Returns the `(accession, member_name)` pair of every pool `MEMBER`, in
/// document order. Members missing either attribute are skipped.
pub fn parse_pool_members(
    experiment_id: &str,
    xml: &[u8],
) -> Result<Vec<MembershipEntry>, ResolverError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut members = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == MEMBER && ends_with(&stack, POOL_PATH) {
                    push_member(experiment_id, e, &mut members)?;
                }
                stack.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == MEMBER && ends_with(&stack, POOL_PATH) {
                    push_member(experiment_id, e, &mut members)?;
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(DocumentKind::Experiment, experiment_id, err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(members)
}

fn push_member(
    experiment_id: &str,
    element: &BytesStart<'_>,
    members: &mut Vec<MembershipEntry>,
) -> Result<(), ResolverError> {
    let mut accession = None;
    let mut member_name = None;
    for attr in element.attributes().flatten() {
        let slot = match attr.key.as_ref() {
            b"accession" => &mut accession,
            b"member_name" => &mut member_name,
            _ => continue,
        };
        *slot = Some(unescape_text(
            DocumentKind::Experiment,
            experiment_id,
            &String::from_utf8_lossy(&attr.value),
        )?);
    }
    match (accession, member_name) {
        (Some(sample_accession), Some(member_name)) => members.push(MembershipEntry {
            sample_accession,
            member_name,
        }),
        (accession, member_name) => warn!(
            experiment = experiment_id,
            ?accession,
            ?member_name,
            "pool member without accession or member_name"
        ),
    }
    Ok(())
}

/// Decodes predefined entities and character references (`&amp;`, `&#35;`).
fn unescape_text(kind: DocumentKind, id: &str, raw: &str) -> Result<String, ResolverError> {
    unescape(raw)
        .map(|text| text.into_owned())
        .map_err(|err| malformed(kind, id, err))
}

fn ends_with(stack: &[Vec<u8>], path: &[&[u8]]) -> bool {
    stack.len() >= path.len()
        && stack[stack.len() - path.len()..]
            .iter()
            .zip(path)
            .all(|(name, expected)| name.as_slice() == *expected)
}

fn malformed(kind: DocumentKind, id: &str, err: impl Display) -> ResolverError {
    ResolverError::MalformedDocument {
        kind: kind.to_string(),
        id: id.to_string(),
        message: err.to_string(),
    }
}
