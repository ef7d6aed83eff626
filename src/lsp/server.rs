//! Main Language Server Protocol server implementation for veriformat
//!
//! Serves document and range formatting by running verible-verilog-format,
//! and publishes the formatter's syntax errors as diagnostics.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result as JsonRpcResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::config::{Settings, SettingsOverrides, load_settings};
use crate::diagnostics::{DiagnosticCollection, DocumentRange};
use crate::lsp::types::{
    DIAGNOSTIC_SOURCE, VeriformatLspConfig, edit_to_lsp, format_diagnostic_to_lsp, from_lsp_range, notice_message_type,
};
use crate::pipeline::{FormatContext, FormatReport, FormatRequest, FormatStatus, InFlightRequests, format_document};

/// Main LSP server for veriformat
pub struct VeriformatLanguageServer {
    client: Client,
    /// Config file passed on the command line
    cli_config_path: Option<String>,
    /// Settings from defaults and the project config file
    file_settings: Arc<RwLock<Settings>>,
    /// Settings pushed by the client, layered on top
    client_settings: Arc<RwLock<SettingsOverrides>>,
    /// Document store for open files
    documents: Arc<RwLock<HashMap<Url, String>>>,
    /// Workspace root folders
    workspace_folders: Arc<RwLock<Vec<PathBuf>>>,
    /// Diagnostics from the last failed formatting run per document
    diagnostics: DiagnosticCollection,
    in_flight: InFlightRequests,
}

impl VeriformatLanguageServer {
    pub fn new(client: Client, cli_config_path: Option<&str>) -> Self {
        Self {
            client,
            cli_config_path: cli_config_path.map(str::to_string),
            file_settings: Arc::new(RwLock::new(Settings::default())),
            client_settings: Arc::new(RwLock::new(SettingsOverrides::default())),
            documents: Arc::new(RwLock::new(HashMap::new())),
            workspace_folders: Arc::new(RwLock::new(Vec::new())),
            diagnostics: DiagnosticCollection::new(DIAGNOSTIC_SOURCE),
            in_flight: InFlightRequests::new(),
        }
    }

    /// Handle to the diagnostic collection shared with formatting requests
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Settings for one request, read fresh each time
    async fn current_settings(&self) -> Settings {
        let client_settings = self.client_settings.read().await;
        self.file_settings.read().await.clone().with(&client_settings)
    }

    /// Load the project config file, preferring an explicit path
    async fn load_file_settings(&self, explicit: Option<&str>) {
        let start_dir = match self.workspace_folders.read().await.first() {
            Some(folder) => folder.clone(),
            None => std::env::current_dir().unwrap_or_default(),
        };

        match load_settings(explicit.map(std::path::Path::new), &start_dir) {
            Ok((settings, _)) => *self.file_settings.write().await = settings,
            Err(e) => {
                log::warn!("Failed to load veriformat config: {e}");
                self.client
                    .show_message(MessageType::WARNING, format!("veriformat: {e}"))
                    .await;
            }
        }
    }

    /// Text of an open document, falling back to the file on disk
    async fn document_text(&self, uri: &Url) -> Option<String> {
        if let Some(text) = self.documents.read().await.get(uri) {
            return Some(text.clone());
        }

        let path = uri.to_file_path().ok()?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Cannot format {uri}: document is not open and could not be read: {e}");
                None
            }
        }
    }

    /// Format a document and deliver feedback to the client
    async fn format(&self, uri: Url, range: Option<DocumentRange>) -> Option<Vec<TextEdit>> {
        let text = self.document_text(&uri).await?;
        let settings = self.current_settings().await;
        let workspace_folders = self.workspace_folders.read().await.clone();

        let guard = self.in_flight.begin(&uri);
        let report = format_document(
            FormatRequest {
                uri: &uri,
                text: &text,
                range,
                cancellation: guard.token(),
            },
            FormatContext {
                settings: &settings,
                workspace_folders: &workspace_folders,
                diagnostics: &self.diagnostics,
            },
        )
        .await;
        drop(guard);

        if report.status == FormatStatus::Cancelled {
            return None;
        }

        self.deliver(&uri, &report).await;
        Some(report.edits().iter().map(edit_to_lsp).collect())
    }

    /// Show notices, mirror raw output and republish diagnostics
    async fn deliver(&self, uri: &Url, report: &FormatReport) {
        for notice in &report.notices {
            self.client
                .show_message(notice_message_type(notice.level), &notice.message)
                .await;
        }

        if let Some(message) = &report.log_message {
            self.client.log_message(MessageType::ERROR, message).await;
        }

        if report.diagnostics_changed {
            self.publish_diagnostics(uri.clone()).await;
        }
    }

    async fn publish_diagnostics(&self, uri: Url) {
        let diagnostics = self.diagnostics.get(&uri).iter().map(format_diagnostic_to_lsp).collect();
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

fn folder_paths(folders: &[WorkspaceFolder]) -> Vec<PathBuf> {
    folders.iter().filter_map(|folder| folder.uri.to_file_path().ok()).collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for VeriformatLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> JsonRpcResult<InitializeResult> {
        log::info!("Initializing veriformat Language Server");

        let mut folders = params.workspace_folders.as_deref().map(folder_paths).unwrap_or_default();
        if folders.is_empty()
            && let Some(root) = params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok())
        {
            folders.push(root);
        }
        *self.workspace_folders.write().await = folders;

        let mut config_path = self.cli_config_path.clone();
        if let Some(options) = &params.initialization_options {
            match VeriformatLspConfig::from_initialization_options(options) {
                Ok(config) => {
                    *self.client_settings.write().await = config.settings;
                    config_path = config.config_path.or(config_path);
                }
                Err(e) => log::warn!("Ignoring initialization options: {e}"),
            }
        }

        self.load_file_settings(config_path.as_deref()).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "veriformat".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("veriformat Language Server initialized");

        self.client
            .log_message(MessageType::INFO, "veriformat Language Server started")
            .await;
    }

    async fn shutdown(&self) -> JsonRpcResult<()> {
        log::info!("Shutting down veriformat Language Server");
        self.in_flight.cancel_all();
        self.diagnostics.dispose();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.documents
            .write()
            .await
            .insert(params.text_document.uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // FULL sync: the last change carries the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .write()
                .await
                .insert(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().await.remove(&uri);
        // A request still running for the closed document must not publish
        self.in_flight.cancel(&uri);

        if !self.diagnostics.get(&uri).is_empty() {
            self.diagnostics.clear(&uri);
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match SettingsOverrides::from_client_value(&params.settings) {
            Ok(overrides) => {
                log::info!("Client settings updated: {overrides:?}");
                *self.client_settings.write().await = overrides;
            }
            Err(e) => {
                log::warn!("Ignoring configuration change: {e}");
            }
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let removed = folder_paths(&params.event.removed);
        let added = folder_paths(&params.event.added);

        let mut folders = self.workspace_folders.write().await;
        folders.retain(|folder| !removed.contains(folder));
        for folder in added {
            if !folders.contains(&folder) {
                folders.push(folder);
            }
        }
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> JsonRpcResult<Option<Vec<TextEdit>>> {
        Ok(self.format(params.text_document.uri, None).await)
    }

    async fn range_formatting(&self, params: DocumentRangeFormattingParams) -> JsonRpcResult<Option<Vec<TextEdit>>> {
        Ok(self
            .format(params.text_document.uri, Some(from_lsp_range(params.range)))
            .await)
    }
}
