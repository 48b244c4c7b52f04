//! Video result type shared by the engine, the guard and the HTTP layer

use serde::{Deserialize, Serialize};

/// One discovered video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    /// Visible title
    pub title: String,

    /// Canonical watch URL
    pub url: String,

    /// Snippet shown next to the result, possibly empty
    #[serde(default)]
    pub description: String,

    /// Duration label, e.g. `12:34`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Channel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// View count label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
}

impl VideoResult {
    /// Create a result with the mandatory fields
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: String::new(),
            duration: None,
            channel: None,
            views: None,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set duration label
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Set channel name
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Set view count label
    pub fn with_views(mut self, views: impl Into<String>) -> Self {
        self.views = Some(views.into());
        self
    }

    /// YouTube video id parsed from the URL, if it is a YouTube link
    pub fn video_id(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
        match host {
            "youtu.be" => parsed
                .path_segments()?
                .next()
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            "youtube.com" => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
                .filter(|id| !id.is_empty()),
            _ => None,
        }
    }
}
