//! Generated `maven-metadata.xml` documents. Nothing here is persisted.

use crate::artifact::Artifact;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

pub const METADATA_FILE: &str = "maven-metadata.xml";

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// `yyyyMMddHHmmss` in UTC.
pub fn format_last_updated(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d%H%M%S").to_string()
}

fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

fn text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> quick_xml::Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Serialize a `<metadata>` document whose body is written by `body`.
fn document<F>(body: F) -> quick_xml::Result<Vec<u8>>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> quick_xml::Result<()>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("metadata").write_inner_content(body)?;
    let mut xml = writer.into_inner();
    xml.push(b'\n');
    Ok(xml)
}

/// Metadata for `group:artifact` across all given versions.
///
/// Returns `None` when `artifacts` is empty. `latest` is the version of the
/// most recently modified artifact; `release` is the newest non-snapshot.
pub fn group_metadata(
    group: &str,
    artifact: &str,
    artifacts: &[Artifact],
) -> quick_xml::Result<Option<Vec<u8>>> {
    // max_by_key keeps the last of equal maxima, i.e. the later upload
    let Some(newest) = artifacts.iter().max_by_key(|a| a.last_modified()) else {
        return Ok(None);
    };
    let latest = newest.version();
    let release = if is_snapshot(latest) {
        artifacts
            .iter()
            .filter(|a| !is_snapshot(a.version()))
            .max_by_key(|a| a.last_modified())
            .map(Artifact::version)
    } else {
        Some(latest)
    };
    let versions: IndexSet<&str> = artifacts.iter().map(Artifact::version).collect();
    let last_updated = format_last_updated(newest.last_modified());

    document(|writer| {
        text_element(writer, "groupId", group)?;
        text_element(writer, "artifactId", artifact)?;
        writer
            .create_element("versioning")
            .write_inner_content(|writer| {
                text_element(writer, "latest", latest)?;
                if let Some(release) = release {
                    text_element(writer, "release", release)?;
                }
                writer
                    .create_element("versions")
                    .write_inner_content(|writer| {
                        for version in &versions {
                            text_element(writer, "version", version)?;
                        }
                        Ok::<(), quick_xml::Error>(())
                    })?;
                text_element(writer, "lastUpdated", &last_updated)
            })?;
        Ok(())
    })
    .map(Some)
}

/// Metadata for a single artifact version.
pub fn artifact_metadata(artifact: &Artifact) -> quick_xml::Result<Vec<u8>> {
    let last_updated = format_last_updated(artifact.last_modified());
    document(|writer| {
        text_element(writer, "groupId", artifact.group())?;
        text_element(writer, "artifactId", artifact.artifact_id())?;
        text_element(writer, "version", artifact.version())?;
        writer
            .create_element("versioning")
            .write_inner_content(|writer| text_element(writer, "lastUpdated", &last_updated))?;
        Ok(())
    })
}
