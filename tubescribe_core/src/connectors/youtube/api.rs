// src/connectors/youtube/api.rs
//
// Thin client for the YouTube Data API v3. These calls are plain
// request/response mappers; empty `items` arrays become ResourceNotFound and
// transport problems bubble up as HttpRequest errors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;
use crate::utils::clean_html_entities;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub struct DataApiClient {
    http: reqwest::Client,
    api_key: String,
}

// --- mapped output types ---

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: Option<String>,
    /// ISO-8601 duration as reported by the API (e.g. "PT4M13S").
    pub duration: Option<String>,
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChannelDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<String>,
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VideoSearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub channel_title: String,
    pub published_at: Option<String>,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CommentInfo {
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: Option<String>,
}

// --- raw API shapes ---

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: Option<ContentDetails>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    snippet: Snippet,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThreadItem {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    author_display_name: String,
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    like_count: u64,
    published_at: Option<String>,
}

impl DataApiClient {
    pub fn new(api_key: String) -> Self {
        DataApiClient {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    async fn get_list<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<Vec<T>, ConnectorError> {
        let response: ListResponse<T> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.items)
    }

    pub async fn video_details(&self, video_id: &str) -> Result<VideoDetails, ConnectorError> {
        let url = format!(
            "{}/videos?part=snippet%2CcontentDetails%2Cstatistics&id={}&key={}",
            API_BASE,
            urlencoding::encode(video_id),
            self.api_key
        );

        let item: VideoItem = self
            .get_list(url)
            .await?
            .into_iter()
            .next()
            .ok_or(ConnectorError::ResourceNotFound)?;

        let stats = item.statistics.unwrap_or(VideoStatistics {
            view_count: None,
            like_count: None,
            comment_count: None,
        });

        Ok(VideoDetails {
            id: item.id,
            title: clean_html_entities(&item.snippet.title),
            description: item.snippet.description,
            channel_id: item.snippet.channel_id,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            duration: item.content_details.and_then(|d| d.duration),
            view_count: stats.view_count,
            like_count: stats.like_count,
            comment_count: stats.comment_count,
        })
    }

    pub async fn channel_details(
        &self,
        channel_id: &str,
    ) -> Result<ChannelDetails, ConnectorError> {
        let url = format!(
            "{}/channels?part=snippet%2Cstatistics&id={}&key={}",
            API_BASE,
            urlencoding::encode(channel_id),
            self.api_key
        );

        let item: ChannelItem = self
            .get_list(url)
            .await?
            .into_iter()
            .next()
            .ok_or(ConnectorError::ResourceNotFound)?;

        let stats = item.statistics.unwrap_or(ChannelStatistics {
            subscriber_count: None,
            video_count: None,
            view_count: None,
        });

        Ok(ChannelDetails {
            id: item.id,
            title: clean_html_entities(&item.snippet.title),
            description: item.snippet.description,
            published_at: item.snippet.published_at,
            subscriber_count: stats.subscriber_count,
            video_count: stats.video_count,
            view_count: stats.view_count,
        })
    }

    pub async fn search_videos(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<VideoSearchHit>, ConnectorError> {
        let url = format!(
            "{}/search?part=snippet&type=video&maxResults={}&q={}&key={}",
            API_BASE,
            limit.clamp(1, 50),
            urlencoding::encode(query),
            self.api_key
        );

        let items: Vec<SearchItem> = self.get_list(url).await?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                Some(VideoSearchHit {
                    url: format!("https://www.youtube.com/watch?v={}", id),
                    id,
                    title: clean_html_entities(&item.snippet.title),
                    channel_title: item.snippet.channel_title,
                    published_at: item.snippet.published_at,
                    description: item.snippet.description,
                })
            })
            .collect())
    }

    pub async fn video_comments(
        &self,
        video_id: &str,
        limit: u64,
    ) -> Result<Vec<CommentInfo>, ConnectorError> {
        let url = format!(
            "{}/commentThreads?part=snippet&videoId={}&maxResults={}&textFormat=plainText&key={}",
            API_BASE,
            urlencoding::encode(video_id),
            limit.clamp(1, 100),
            self.api_key
        );

        let items: Vec<CommentThreadItem> = self.get_list(url).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet.top_level_comment.snippet;
                CommentInfo {
                    author: snippet.author_display_name,
                    text: clean_html_entities(&snippet.text_display),
                    like_count: snippet.like_count,
                    published_at: snippet.published_at,
                }
            })
            .collect())
    }
}
