//! Video operation types for the Veo polling flow.

use serde::{Deserialize, Serialize};

/// Handle for an in-flight asynchronous video render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOperation {
    /// Opaque operation name returned by the video capability; poll key
    pub name: String,
}

/// Snapshot of a video operation's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOperationStatus {
    /// Once true, the operation is terminal
    pub done: bool,
    /// Present only when done and successful. A done operation without a URL
    /// is still treated as success, just with no playable asset.
    #[serde(default)]
    pub video_url: Option<String>,
}

impl VideoOperationStatus {
    /// Still-rendering snapshot.
    pub fn pending() -> Self {
        Self {
            done: false,
            video_url: None,
        }
    }

    /// Completed snapshot with an optional asset URL.
    pub fn completed(video_url: Option<String>) -> Self {
        Self {
            done: true,
            video_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_without_url_deserializes() {
        let status: VideoOperationStatus = serde_json::from_str(r#"{"done": false}"#).unwrap();
        assert!(!status.done);
        assert!(status.video_url.is_none());
    }
}
