use askama::Template;
use tracing::error;

use crate::artifact::Artifact;
use crate::error::{AppError, AppResult};

/// Stylesheet served when no override is configured.
pub const DEFAULT_STYLESHEET: &str = include_str!("../static/style.css");

/// One step of the breadcrumb trail.
#[derive(Clone, Debug)]
pub struct Crumb {
    pub label: String,
    pub href: String,
}

/// A listed entry linking one level deeper.
#[derive(Clone, Debug)]
pub struct Link {
    pub label: String,
    pub href: String,
}

/// A downloadable file on the version page. Its checksums are linked, not inlined.
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub name: String,
    pub href: String,
}

#[derive(Template)]
#[template(path = "groups.html")]
struct GroupsTemplate {
    base: String,
    crumbs: Vec<Crumb>,
    groups: Vec<Link>,
}

#[derive(Template)]
#[template(path = "artifacts.html")]
struct ArtifactsTemplate {
    base: String,
    crumbs: Vec<Crumb>,
    group: String,
    artifacts: Vec<Link>,
}

#[derive(Template)]
#[template(path = "versions.html")]
struct VersionsTemplate {
    base: String,
    crumbs: Vec<Crumb>,
    group: String,
    artifact: String,
    versions: Vec<Link>,
    metadata_href: String,
}

#[derive(Template)]
#[template(path = "version.html")]
struct VersionTemplate {
    base: String,
    crumbs: Vec<Crumb>,
    group: String,
    artifact: String,
    version: String,
    packaging: String,
    last_modified: String,
    files: Vec<FileEntry>,
}

fn render<T: Template>(template: &T) -> AppResult<String> {
    template.render().map_err(|e| {
        error!("Template render error: {}", e);
        AppError::Anyhow(anyhow::anyhow!("Template render error: {}", e))
    })
}

/// Breadcrumbs for the given path segments, starting at the repository root.
fn breadcrumbs(base: &str, segments: &[&str]) -> Vec<Crumb> {
    let mut crumbs = vec![Crumb {
        label: "repository".to_string(),
        href: format!("{}/", base),
    }];
    let mut href = base.to_string();
    for segment in segments {
        href = format!("{}/{}", href, segment);
        crumbs.push(Crumb {
            label: segment.to_string(),
            href: format!("{}/", href),
        });
    }
    crumbs
}

pub fn render_groups(base: &str, groups: &[String]) -> AppResult<String> {
    render(&GroupsTemplate {
        base: base.to_string(),
        crumbs: breadcrumbs(base, &[]),
        groups: groups
            .iter()
            .map(|group| Link {
                label: group.clone(),
                href: format!("{}/{}/", base, group),
            })
            .collect(),
    })
}

pub fn render_artifacts(base: &str, group: &str, artifacts: &[String]) -> AppResult<String> {
    render(&ArtifactsTemplate {
        base: base.to_string(),
        crumbs: breadcrumbs(base, &[group]),
        group: group.to_string(),
        artifacts: artifacts
            .iter()
            .map(|artifact| Link {
                label: artifact.clone(),
                href: format!("{}/{}/{}/", base, group, artifact),
            })
            .collect(),
    })
}

pub fn render_versions(
    base: &str,
    group: &str,
    artifact: &str,
    versions: &[String],
) -> AppResult<String> {
    render(&VersionsTemplate {
        base: base.to_string(),
        crumbs: breadcrumbs(base, &[group, artifact]),
        group: group.to_string(),
        artifact: artifact.to_string(),
        versions: versions
            .iter()
            .map(|version| Link {
                label: version.clone(),
                href: format!("{}/{}/{}/{}/", base, group, artifact, version),
            })
            .collect(),
        metadata_href: format!("{}/{}/{}/maven-metadata.xml", base, group, artifact),
    })
}

pub fn render_version(base: &str, artifact: &Artifact, files: Vec<FileEntry>) -> AppResult<String> {
    render(&VersionTemplate {
        base: base.to_string(),
        crumbs: breadcrumbs(base, &[artifact.group(), artifact.artifact_id(), artifact.version()]),
        group: artifact.group().to_string(),
        artifact: artifact.artifact_id().to_string(),
        version: artifact.version().to_string(),
        packaging: artifact.packaging().to_string(),
        last_modified: artifact.last_modified().to_rfc2822(),
        files,
    })
}
