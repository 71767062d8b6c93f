//! # Descriptor Parsing
//!
//! Extracts project coordinates from the two places Maven records them:
//!
//! - the POM itself (`project/groupId`, `project/artifactId`,
//!   `project/version`, `project/packaging`, with `groupId` and `version`
//!   inherited from `project/parent` when not declared)
//! - the `META-INF/maven/<group>/<artifact>/pom.properties` bundle written into
//!   every archive built by Maven
//!
//! Both parsers are small explicit readers; nothing here touches the store.

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

const EMBEDDED_PREFIX: &str = "META-INF/maven/";
const EMBEDDED_PROPERTIES: &str = "/pom.properties";
const EMBEDDED_POM: &str = "/pom.xml";

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("malformed descriptor XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("descriptor is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unreadable archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Could not find the pom.properties file in the maven artifact")]
    MissingProperties,

    #[error("I/O error while reading descriptor: {0}")]
    Io(#[from] std::io::Error),
}

/// The identifying triple every descriptor must provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectId {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// Fields read from a POM; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    parent_group_id: Option<String>,
    parent_version: Option<String>,
}

impl PomDescriptor {
    /// `groupId`, falling back to the parent's.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent_group_id.as_deref())
    }

    /// `version`, falling back to the parent's.
    pub fn effective_version(&self) -> Option<&str> {
        self.version.as_deref().or(self.parent_version.as_deref())
    }

    pub fn declares_pom_packaging(&self) -> bool {
        self.packaging.as_deref() == Some("pom")
    }

    pub fn project_id(&self) -> Result<ProjectId, DescriptorError> {
        Ok(ProjectId {
            group_id: self
                .effective_group_id()
                .ok_or(DescriptorError::MissingField("groupId"))?
                .to_string(),
            artifact_id: self
                .artifact_id
                .clone()
                .ok_or(DescriptorError::MissingField("artifactId"))?,
            version: self
                .effective_version()
                .ok_or(DescriptorError::MissingField("version"))?
                .to_string(),
        })
    }
}

/// Parse POM bytes, keeping only the fields relevant to coordinates.
pub fn parse_pom(bytes: &[u8]) -> Result<PomDescriptor, DescriptorError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut descriptor = PomDescriptor::default();
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                assign_field(&mut descriptor, &path, text.trim());
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                assign_field(&mut descriptor, &path, text.trim());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(descriptor)
}

fn assign_field(descriptor: &mut PomDescriptor, path: &[String], value: &str) {
    if value.is_empty() {
        return;
    }
    let names: Vec<&str> = path.iter().map(String::as_str).collect();
    let slot = match names.as_slice() {
        ["project", "groupId"] => &mut descriptor.group_id,
        ["project", "artifactId"] => &mut descriptor.artifact_id,
        ["project", "version"] => &mut descriptor.version,
        ["project", "packaging"] => &mut descriptor.packaging,
        ["project", "parent", "groupId"] => &mut descriptor.parent_group_id,
        ["project", "parent", "version"] => &mut descriptor.parent_version,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

/// Parse Java `.properties` text.
///
/// Supports `key=value` and `key: value`, `#`/`!` comments and backslash line
/// continuations. Later keys override earlier ones.
pub fn parse_properties(text: &str) -> IndexMap<String, String> {
    let mut properties = IndexMap::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.trim_start();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }
        pending.push_str(line);

        let entry = std::mem::take(&mut pending);
        let split_at = entry.find(['=', ':']);
        let (key, value) = match split_at {
            Some(idx) => (&entry[..idx], &entry[idx + 1..]),
            None => (entry.as_str(), ""),
        };
        let key = key.trim();
        if !key.is_empty() {
            properties.insert(key.to_string(), value.trim().to_string());
        }
    }

    properties
}

fn find_embedded<R: Read + Seek>(
    archive: &ZipArchive<R>,
    suffix: &str,
) -> Option<String> {
    archive
        .file_names()
        .find(|name| name.starts_with(EMBEDDED_PREFIX) && name.ends_with(suffix))
        .map(str::to_owned)
}

/// Read the coordinates from the embedded `pom.properties` of an archive.
pub fn read_embedded_properties<R: Read + Seek>(reader: R) -> Result<ProjectId, DescriptorError> {
    let mut archive = ZipArchive::new(reader)?;
    let name =
        find_embedded(&archive, EMBEDDED_PROPERTIES).ok_or(DescriptorError::MissingProperties)?;

    let mut text = String::new();
    archive.by_name(&name)?.read_to_string(&mut text)?;
    let mut properties = parse_properties(&text);

    let mut take = |field: &'static str| {
        properties
            .swap_remove(field)
            .filter(|value| !value.is_empty())
            .ok_or(DescriptorError::MissingField(field))
    };
    Ok(ProjectId {
        group_id: take("groupId")?,
        artifact_id: take("artifactId")?,
        version: take("version")?,
    })
}

/// Bytes of the embedded `pom.xml`, if the archive carries one.
pub fn read_embedded_pom<R: Read + Seek>(reader: R) -> Result<Option<Vec<u8>>, DescriptorError> {
    let mut archive = ZipArchive::new(reader)?;
    let Some(name) = find_embedded(&archive, EMBEDDED_POM) else {
        return Ok(None);
    };
    let mut bytes = Vec::new();
    archive.by_name(&name)?.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}
