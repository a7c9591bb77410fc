//! CLI commands

use anyhow::{Context, Result};
use chat_http::{
    ApiClient, ClientConfig, ClientError, FileStore, KeyValueStore, Method, StaticToken,
};
use clap::Subcommand;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// GET a path relative to the base URL
    Get { path: String },

    /// POST a JSON body
    Post {
        path: String,

        /// JSON request body
        #[arg(short, long, default_value = "{}")]
        data: String,
    },

    /// PUT a JSON body
    Put {
        path: String,

        /// JSON request body
        #[arg(short, long, default_value = "{}")]
        data: String,
    },

    /// PATCH with a JSON body
    Patch {
        path: String,

        /// JSON request body
        #[arg(short, long, default_value = "{}")]
        data: String,
    },

    /// DELETE a path
    Delete { path: String },

    /// Manage the stored access token
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Store an access token obtained elsewhere
    Set { token: String },

    /// Remove the stored access token
    Clear,

    /// Report whether an access token is stored
    Status,
}

impl Commands {
    /// Run the command; `token` replaces the stored access token for requests
    pub async fn execute(
        self,
        config: ClientConfig,
        token_file: PathBuf,
        token: Option<String>,
    ) -> Result<()> {
        let token_key = config.token_key.clone();
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(token_file));

        let (method, path, body) = match self {
            Self::Token { command } => return command.execute(store.as_ref(), &token_key),
            Self::Get { path } => (Method::GET, path, None),
            Self::Delete { path } => (Method::DELETE, path, None),
            Self::Post { path, data } => (Method::POST, path, Some(data)),
            Self::Put { path, data } => (Method::PUT, path, Some(data)),
            Self::Patch { path, data } => (Method::PATCH, path, Some(data)),
        };

        let builder = ApiClient::builder().config(config);
        let client = match token {
            Some(token) => builder.token_provider(StaticToken::new(token)),
            None => builder.token_store(store),
        }
        .build()?;

        let mut request = client.request(method.clone(), &path);
        if let Some(data) = body {
            let body: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
            request = request.json(&body);
        }

        info!(%method, url = %client.url_for(&path), "Sending request");
        let response = client.send(request).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_status(status, text).into());
        }

        print_body(&text);
        Ok(())
    }
}

impl TokenCommands {
    fn execute(self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        match self {
            Self::Set { token } => {
                store.set_item(key, token.trim())?;
                info!(key, "Stored access token");
            }
            Self::Clear => {
                store.remove_item(key)?;
                info!(key, "Cleared access token");
            }
            Self::Status => match store.get_item(key).filter(|t| !t.is_empty()) {
                Some(_) => println!("{key}: present"),
                None => println!("{key}: absent"),
            },
        }
        Ok(())
    }
}

/// Pretty-print JSON bodies, pass anything else through
fn print_body(text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(json) => println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| text.to_string())
        ),
        Err(_) => println!("{text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_http::ACCESS_TOKEN;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_file_with(dir: &tempfile::TempDir, token: &str) -> PathBuf {
        let token_file = dir.path().join("tokens.json");
        FileStore::new(&token_file)
            .set_item(ACCESS_TOKEN, token)
            .unwrap();
        token_file
    }

    #[tokio::test]
    async fn test_get_sends_stored_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/chat/conversations"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::with_base_url(format!("{}/chat/", mock_server.uri()));

        Commands::Get {
            path: "conversations".into(),
        }
        .execute(config, token_file_with(&dir, "abc123"), None)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_token_flag_replaces_stored_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/chat/conversations/3/messages/9"))
            .and(header("authorization", "Bearer from-flag"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::with_base_url(format!("{}/chat/", mock_server.uri()));

        Commands::Delete {
            path: "conversations/3/messages/9".into(),
        }
        .execute(
            config,
            token_file_with(&dir, "stored"),
            Some("from-flag".into()),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_fails_the_command() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/chat/conversations/42"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found."))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::with_base_url(format!("{}/chat/", mock_server.uri()));

        let err = Commands::Get {
            path: "conversations/42".into(),
        }
        .execute(config, token_file_with(&dir, "abc123"), None)
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::NotFound(message)) if message == "Not found."
        ));
    }

    #[tokio::test]
    async fn test_invalid_data_is_rejected_before_sending() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::with_base_url(format!("{}/chat/", mock_server.uri()));

        let err = Commands::Post {
            path: "messages".into(),
            data: "{".into(),
        }
        .execute(config, token_file_with(&dir, "abc123"), None)
        .await
        .unwrap_err();

        assert!(err.to_string().contains("--data is not valid JSON"));
    }

    #[test]
    fn test_token_set_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("tokens.json"));

        TokenCommands::Set {
            token: " abc123\n".into(),
        }
        .execute(&store, ACCESS_TOKEN)
        .unwrap();
        assert_eq!(store.get_item(ACCESS_TOKEN).as_deref(), Some("abc123"));

        TokenCommands::Clear.execute(&store, ACCESS_TOKEN).unwrap();
        assert_eq!(store.get_item(ACCESS_TOKEN), None);
    }
}
