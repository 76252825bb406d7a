//! JSON payloads of the gallery endpoints.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::uri::{thumbnail_url, to_file_uri};
use crate::status::{FileRecord, GalleryGroup, Snapshot};
use crate::utils::mime;

/// Body of `/check_for_refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshInfo {
    pub lastupdate: u64,
}

/// Body of `/gallery_data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryData {
    /// Counter of the snapshot the groups were read from.
    #[serde(default)]
    pub lastupdate: u64,
    pub gallery_data: Vec<GroupView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub header: String,
    pub processing: bool,
    pub files: Vec<FileView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub file_uri: String,
    pub thumbnail_url: String,
    pub label: String,
    pub currenttype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub stale: bool,
}

impl GalleryData {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            lastupdate: snapshot.counter,
            gallery_data: snapshot
                .groups
                .iter()
                .map(|g| GroupView::from_group(g))
                .collect(),
        }
    }
}

impl GroupView {
    pub fn from_group(group: &GalleryGroup) -> Self {
        Self {
            header: group.header.clone(),
            processing: group.processing(),
            files: group
                .files
                .iter()
                .map(|f| FileView::from_record(f, &group.source.path, group.generation))
                .collect(),
        }
    }

    /// Stable serialized form, used to decide whether a group needs re-rendering.
    pub fn serialized(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl FileView {
    pub fn from_record(record: &FileRecord, source: &Path, generation: u64) -> Self {
        let shown = record.artifact.as_ref().map(|a| a.output_path.as_path());

        // Formats a browser cannot draw are previewed through their source.
        let preview = shown
            .filter(|path| mime::is_displayable_image(mime::from_path(path)))
            .unwrap_or(source);

        Self {
            file_uri: to_file_uri(&record.output_path),
            thumbnail_url: thumbnail_url(preview, generation),
            label: record
                .output_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            currenttype: record.format.id().to_string(),
            embed: record
                .artifact
                .as_ref()
                .and_then(|a| a.embedded_original_path.as_deref())
                .map(to_file_uri),
            error: record.error.clone(),
            stale: record.stale,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::export::ExportFormat;
    use crate::status::{ExportArtifact, SourceStatus, WatchedSource};

    fn group() -> GalleryGroup {
        let source = PathBuf::from("/w/plot.svg");
        let pdf = ExportArtifact::new(ExportFormat::Pdf, "/w/plot.pdf".into(), &source);
        let png = ExportArtifact::new(ExportFormat::Png, "/w/plot.png".into(), &source);
        let mut watched = WatchedSource::new(source);
        watched.status = SourceStatus::Done;
        GalleryGroup {
            header: "plot.svg".into(),
            source: watched,
            files: vec![
                FileRecord::fresh(pdf),
                FileRecord::fresh(png),
                FileRecord {
                    format: ExportFormat::Emf,
                    output_path: "/w/plot.emf".into(),
                    artifact: None,
                    error: Some("unsupported export format emf".into()),
                    stale: false,
                },
            ],
            generation: 3,
        }
    }

    #[test]
    fn test_group_view() {
        let view = GroupView::from_group(&group());
        assert_eq!(view.header, "plot.svg");
        assert!(!view.processing);

        let pdf = &view.files[0];
        assert_eq!(pdf.file_uri, "file:///w/plot.pdf");
        assert_eq!(pdf.label, "plot.pdf");
        assert_eq!(pdf.currenttype, "pdf");
        assert_eq!(pdf.embed, None);
        // PDF is previewed through the source document.
        assert_eq!(pdf.thumbnail_url, thumbnail_url(Path::new("/w/plot.svg"), 3));

        let png = &view.files[1];
        assert_eq!(png.thumbnail_url, thumbnail_url(Path::new("/w/plot.png"), 3));
        assert_eq!(png.embed.as_deref(), Some("file:///w/plot.svg"));

        let emf = &view.files[2];
        assert_eq!(emf.file_uri, "file:///w/plot.emf");
        assert!(emf.error.is_some());
    }

    #[test]
    fn test_json_shape() {
        let snapshot = Snapshot {
            counter: 9,
            groups: vec![Arc::new(group())],
        };
        let json = serde_json::to_value(GalleryData::from_snapshot(&snapshot)).unwrap();
        assert_eq!(json["lastupdate"], 9);
        let files = &json["gallery_data"][0]["files"];
        assert_eq!(files[0]["currenttype"], "pdf");
        assert!(files[0].get("embed").is_none());
        assert_eq!(files[1]["embed"], "file:///w/plot.svg");
        assert_eq!(files[2]["stale"], false);
    }

    #[test]
    fn test_serialized_form_tracks_processing() {
        let mut g = group();
        let done = GroupView::from_group(&g).serialized();
        g.source.status = SourceStatus::Processing;
        assert_ne!(GroupView::from_group(&g).serialized(), done);
    }
}
