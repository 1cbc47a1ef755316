//! Video catalog store.
//!
//! Holds the uploaded video list, the upload wizard's step and file
//! selection, and upload progress. Persisted in full under
//! `zeno-store-videos` under the camelCase keys the browser build uses.
//! Stored videos load leniently: fractional ids are truncated and missing
//! keys take their defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config::StoreOptions;
use crate::error::Result;
use crate::reactive::{make_ref, ReactiveObject, Ref};
use crate::store::{PersistConfig, PersistField, StoreRegistry, StoreState, UseStore};

/// Registry name of the video store.
pub const VIDEO_STORE: &str = "videos";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Video {
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    pub title: String,
    pub category: String,
    pub subject: String,
    pub upload_date: DateTime<Utc>,
    pub views: u64,
    /// Length in seconds.
    pub duration: u32,
    /// Size in bytes.
    pub size: u64,
    pub url: String,
}

/// Accept integer ids as well as the timestamp-plus-random floats the
/// browser build assigns.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StoredId {
        Integer(u64),
        Float(f64),
    }

    Ok(match StoredId::deserialize(deserializer)? {
        StoredId::Integer(id) => id,
        StoredId::Float(id) => id.max(0.0) as u64,
    })
}

/// A file picked for upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoFile {
    pub title: String,
    pub category: String,
    pub subject: String,
    pub duration: Option<u32>,
    pub size: Option<u64>,
    pub url: Option<String>,
}

impl VideoFile {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }
}

/// Partial update applied by [`VideoStore::update_video`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub duration: Option<u32>,
    pub url: Option<String>,
}

impl VideoUpdate {
    fn apply(self, video: &mut Video) {
        if let Some(title) = self.title {
            video.title = title;
        }
        if let Some(category) = self.category {
            video.category = category;
        }
        if let Some(subject) = self.subject {
            video.subject = subject;
        }
        if let Some(duration) = self.duration {
            video.duration = duration;
        }
        if let Some(url) = self.url {
            video.url = url;
        }
    }
}

/// State of the video store.
///
/// Every collection change goes through [`Ref::update`], so readers and the
/// persistence effect see it.
pub struct VideoStore {
    pub videos: Ref<Vec<Video>>,
    pub current_step: Ref<u32>,
    pub upload_progress: ReactiveObject,
    pub selected_files: Ref<Vec<VideoFile>>,
}

impl VideoStore {
    pub fn new() -> Self {
        Self {
            videos: make_ref(Vec::new()),
            current_step: make_ref(1),
            upload_progress: ReactiveObject::from_json(json!({ "overall": 0, "files": [] })),
            selected_files: make_ref(Vec::new()),
        }
    }

    pub fn select_files(&self, files: Vec<VideoFile>) {
        self.selected_files.set(files);
    }

    /// Add every selected file to the catalog.
    ///
    /// Returns the added videos; empty (with a warning) if nothing is
    /// selected.
    pub fn upload_videos(&self) -> Vec<Video> {
        let files = self.selected_files.get();
        if files.is_empty() {
            warn!(store = VIDEO_STORE, "no files selected for upload");
            return Vec::new();
        }
        files.into_iter().map(|file| self.add_video(file)).collect()
    }

    pub fn add_video(&self, file: VideoFile) -> Video {
        let id = self
            .videos
            .peek(|videos| videos.iter().map(|v| v.id).max().map_or(1, |max| max + 1));
        let video = Video {
            id,
            title: file.title,
            category: file.category,
            subject: file.subject,
            upload_date: Utc::now(),
            views: 0,
            duration: file.duration.unwrap_or(0),
            size: file.size.unwrap_or(0),
            url: file.url.unwrap_or_else(|| "#".to_owned()),
        };
        self.videos.update(|videos| videos.push(video.clone()));
        video
    }

    /// Remove a video. Returns whether it existed.
    pub fn delete_video(&self, id: u64) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.videos.update(|videos| {
            videos.remove(index);
        });
        true
    }

    pub fn update_video(&self, id: u64, patch: VideoUpdate) -> Option<Video> {
        let index = self.position(id)?;
        Some(self.videos.update(|videos| {
            patch.apply(&mut videos[index]);
            videos[index].clone()
        }))
    }

    pub fn increment_views(&self, id: u64) -> Option<Video> {
        let index = self.position(id)?;
        Some(self.videos.update(|videos| {
            videos[index].views += 1;
            videos[index].clone()
        }))
    }

    pub fn videos_by_category(&self, category: &str) -> Vec<Video> {
        self.filter(|v| v.category == category)
    }

    pub fn videos_by_subject(&self, subject: &str) -> Vec<Video> {
        self.filter(|v| v.subject == subject)
    }

    /// Case-insensitive substring search over title, category and subject.
    pub fn search_videos(&self, query: &str) -> Vec<Video> {
        let query = query.to_lowercase();
        self.filter(|v| {
            v.title.to_lowercase().contains(&query)
                || v.category.to_lowercase().contains(&query)
                || v.subject.to_lowercase().contains(&query)
        })
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.videos.peek(|videos| videos.iter().position(|v| v.id == id))
    }

    fn filter(&self, keep: impl Fn(&Video) -> bool) -> Vec<Video> {
        self.videos
            .with(|videos| videos.iter().filter(|v| keep(v)).cloned().collect())
    }
}

impl Default for VideoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState for VideoStore {
    fn fields(&self) -> Vec<(&'static str, &dyn PersistField)> {
        vec![
            ("videos", &self.videos as &dyn PersistField),
            ("currentStep", &self.current_step as &dyn PersistField),
            ("uploadProgress", &self.upload_progress as &dyn PersistField),
            ("selectedFiles", &self.selected_files as &dyn PersistField),
        ]
    }
}

/// Define (or fetch) the persisted video store.
pub fn define_video_store(registry: &StoreRegistry) -> Result<UseStore<VideoStore>> {
    registry.define_store(
        VIDEO_STORE,
        VideoStore::new,
        StoreOptions::persist(PersistConfig::All),
    )
}
