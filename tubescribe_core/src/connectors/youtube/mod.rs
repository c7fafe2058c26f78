// src/connectors/youtube/mod.rs

pub mod api;
pub mod captions;
pub mod timed_text;

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::auth::AuthDetails;
use crate::capabilities::{ConnectorConfigSchema, Field, FieldType};
use crate::error::ConnectorError;
use crate::utils::structured_result_with_text;
use crate::Connector;

use api::DataApiClient;

// Input structs for tools

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetVideoDetailsInput {
    /// The YouTube video ID (e.g., 'dQw4w9WgXcQ') or full URL
    pub video_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetChannelDetailsInput {
    /// The YouTube channel ID (e.g., 'UCuAXFkgsw1L7xaCfnd5JJOw')
    pub channel_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchVideosInput {
    /// Search query string
    pub query: String,
    /// Maximum number of results to return
    #[serde(default = "default_search_limit")]
    #[schemars(default = "default_search_limit")]
    pub limit: u64,
}

fn default_search_limit() -> u64 {
    10
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetVideoCommentsInput {
    /// The YouTube video ID or full URL
    pub video_id: String,
    /// Maximum number of top-level comments to return
    #[serde(default = "default_comment_limit")]
    #[schemars(default = "default_comment_limit")]
    pub limit: u64,
}

fn default_comment_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTranscriptInput {
    /// The YouTube video ID (e.g., 'dQw4w9WgXcQ') or full URL
    pub video_id: String,
    /// Caption language code to fetch (e.g. 'en', 'en-US')
    #[serde(default = "default_language")]
    #[schemars(default = "default_language")]
    pub language: String,
    /// Also return a regenerated .vtt file alongside the parsed transcript
    #[serde(default)]
    pub save_to_file: bool,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchVideosOutput {
    pub query: String,
    pub results: Vec<api::VideoSearchHit>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetVideoCommentsOutput {
    pub video_id: String,
    pub comments: Vec<api::CommentInfo>,
}

#[derive(Clone, Default)]
pub struct YouTubeConnector {
    api_key: Option<String>,
}

impl YouTubeConnector {
    pub async fn new(auth: Option<AuthDetails>) -> Result<Self, ConnectorError> {
        let mut connector = YouTubeConnector { api_key: None };

        if let Some(auth) = auth {
            connector.set_auth_details(auth).await?;
        }

        Ok(connector)
    }

    fn api_client(&self) -> Result<DataApiClient, ConnectorError> {
        let key = self.api_key.clone().ok_or_else(|| {
            ConnectorError::Authentication(
                "YouTube Data API key not configured; set it via auth/youtube/set".to_string(),
            )
        })?;
        Ok(DataApiClient::new(key))
    }
}

#[async_trait]
impl Connector for YouTubeConnector {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn description(&self) -> &'static str {
        "YouTube video and channel metadata, search, comments, and caption transcript extraction."
    }

    async fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: None,
            ..Default::default()
        }
    }

    async fn get_auth_details(&self) -> Result<AuthDetails, ConnectorError> {
        Ok(AuthDetails::new())
    }

    async fn set_auth_details(&mut self, details: AuthDetails) -> Result<(), ConnectorError> {
        if let Some(key) = details.get("api_key") {
            self.api_key = Some(key.to_string());
        }
        Ok(())
    }

    fn config_schema(&self) -> ConnectorConfigSchema {
        ConnectorConfigSchema {
            fields: vec![Field {
                name: "api_key".to_string(),
                label: "YouTube Data API key".to_string(),
                field_type: FieldType::Secret,
                required: true,
                description: Some(
                    "API key for the YouTube Data API v3; required by the metadata tools, \
                     not by transcript extraction."
                        .to_string(),
                ),
            }],
        }
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
    ) -> Result<InitializeResult, ConnectorError> {
        Ok(InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.capabilities().await,
            server_info: Implementation {
                name: self.name().to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "YouTube connector for video metadata, search, comments, and transcripts"
                    .to_string(),
            ),
        })
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, ConnectorError> {
        Ok(ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        _request: ReadResourceRequestParam,
    ) -> Result<Vec<ResourceContents>, ConnectorError> {
        Err(ConnectorError::ResourceNotFound)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ConnectorError> {
        let tools = vec![
            Tool {
                name: Cow::Borrowed("get_video_details"),
                title: None,
                description: Some(Cow::Borrowed(
                    "Given a YouTube video id or URL, returns title, channel, publish date, \
                     duration, view/like/comment counts, and description.",
                )),
                input_schema: Arc::new(tool_schema::<GetVideoDetailsInput>()?),
                output_schema: None,
                annotations: None,
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("get_channel_details"),
                title: None,
                description: Some(Cow::Borrowed(
                    "Given a YouTube channel id, returns title, description, and \
                     subscriber/video/view counts.",
                )),
                input_schema: Arc::new(tool_schema::<GetChannelDetailsInput>()?),
                output_schema: None,
                annotations: None,
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("search_videos"),
                title: None,
                description: Some(Cow::Borrowed(
                    "Search YouTube videos by query. Returns id, title, channel, publish date, \
                     and description per hit.",
                )),
                input_schema: Arc::new(tool_schema::<SearchVideosInput>()?),
                output_schema: None,
                annotations: None,
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("get_video_comments"),
                title: None,
                description: Some(Cow::Borrowed(
                    "Fetch top-level comments for a video: author, text, like count, publish date.",
                )),
                input_schema: Arc::new(tool_schema::<GetVideoCommentsInput>()?),
                output_schema: None,
                annotations: None,
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("get_transcript"),
                title: None,
                description: Some(Cow::Borrowed(
                    "Extract the caption transcript for a video in the requested language. \
                     Returns timed cues plus a flat text rendering; optionally also a \
                     regenerated .vtt file. Reports available languages when the requested \
                     one does not exist.",
                )),
                input_schema: Arc::new(tool_schema::<GetTranscriptInput>()?),
                output_schema: None,
                annotations: None,
                icons: None,
            },
        ];

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ConnectorError> {
        let name = request.name.as_ref();
        let args = request.arguments.unwrap_or_default();
        let args_map = serde_json::Map::from_iter(args);

        match name {
            "get_video_details" => {
                let input: GetVideoDetailsInput = serde_json::from_value(Value::Object(args_map))
                    .map_err(|e| ConnectorError::InvalidParams(e.to_string()))?;

                let video_id = extract_video_id(&input.video_id);
                let details = self.api_client()?.video_details(&video_id).await?;

                let text = serde_json::to_string(&details)?;
                Ok(structured_result_with_text(&details, Some(text))?)
            }
            "get_channel_details" => {
                let input: GetChannelDetailsInput = serde_json::from_value(Value::Object(args_map))
                    .map_err(|e| ConnectorError::InvalidParams(e.to_string()))?;

                let details = self
                    .api_client()?
                    .channel_details(&input.channel_id)
                    .await?;

                let text = serde_json::to_string(&details)?;
                Ok(structured_result_with_text(&details, Some(text))?)
            }
            "search_videos" => {
                let input: SearchVideosInput = serde_json::from_value(Value::Object(args_map))
                    .map_err(|e| ConnectorError::InvalidParams(e.to_string()))?;

                let results = self
                    .api_client()?
                    .search_videos(&input.query, input.limit)
                    .await?;

                let output = SearchVideosOutput {
                    query: input.query,
                    results,
                };
                let text = serde_json::to_string(&output)?;
                Ok(structured_result_with_text(&output, Some(text))?)
            }
            "get_video_comments" => {
                let input: GetVideoCommentsInput = serde_json::from_value(Value::Object(args_map))
                    .map_err(|e| ConnectorError::InvalidParams(e.to_string()))?;

                let video_id = extract_video_id(&input.video_id);
                let comments = self
                    .api_client()?
                    .video_comments(&video_id, input.limit)
                    .await?;

                let output = GetVideoCommentsOutput { video_id, comments };
                let text = serde_json::to_string(&output)?;
                Ok(structured_result_with_text(&output, Some(text))?)
            }
            "get_transcript" => {
                let input: GetTranscriptInput = serde_json::from_value(Value::Object(args_map))
                    .map_err(|e| ConnectorError::InvalidParams(e.to_string()))?;

                let video_id = extract_video_id(&input.video_id);

                // Every pipeline outcome (unavailable, extracted, failed)
                // comes back as a structured payload, never as a fault.
                let result =
                    captions::extract_transcript(&video_id, &input.language, input.save_to_file)
                        .await;

                let text = serde_json::to_string(&result)?;
                Ok(structured_result_with_text(&result, Some(text))?)
            }
            _ => Err(ConnectorError::ToolNotFound),
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListPromptsResult, ConnectorError> {
        Ok(ListPromptsResult {
            prompts: vec![],
            next_cursor: None,
        })
    }

    async fn get_prompt(&self, _name: &str) -> Result<Prompt, ConnectorError> {
        Err(ConnectorError::MethodNotFound)
    }

    async fn test_auth(&self) -> Result<(), ConnectorError> {
        Ok(())
    }
}

fn tool_schema<T: JsonSchema>() -> Result<serde_json::Map<String, Value>, ConnectorError> {
    Ok(serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| ConnectorError::Other(e.to_string()))?
        .as_object()
        .expect("Schema object")
        .clone())
}

// Helper function to extract video ID from either a full URL or just the ID
fn extract_video_id(input: &str) -> String {
    // Check if the input is a URL
    if input.starts_with("http") {
        if let Ok(url) = Url::parse(input) {
            // Extract video ID from query parameters (youtube.com/watch?v=VIDEO_ID)
            if let Some(pairs) = url.query_pairs().find(|(key, _)| key == "v") {
                return pairs.1.to_string();
            }

            // Extract from path segments (youtu.be/VIDEO_ID)
            let path = url.path();
            if url.host_str() == Some("youtu.be") && path.len() > 1 {
                return path[1..].to_string();
            }
        }
    }

    // If not a URL or couldn't extract ID, assume the input is already a video ID
    input.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_video_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn extract_video_id_from_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn extract_video_id_passes_bare_ids_through() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn transcript_input_defaults() {
        let input: GetTranscriptInput =
            serde_json::from_value(serde_json::json!({"video_id": "abc123"})).unwrap();
        assert_eq!(input.language, "en");
        assert!(!input.save_to_file);
    }
}
