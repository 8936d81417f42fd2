use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use era_indenter::{
    format_lines, split_lines, Diagnostic, Diagnostics, FormatOutcome, IndentUnit, Indenter,
    IndenterConfig, Line, LineEdit, TRIGGER_CHARACTERS,
};
use serde_json::Value;
use tokio::{
    sync::Mutex,
    task,
    time::{sleep, Duration},
};
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{
    Diagnostic as LspDiagnostic, DiagnosticSeverity, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentFormattingParams, DocumentOnTypeFormattingOptions, DocumentOnTypeFormattingParams,
    DocumentRangeFormattingParams, FormattingOptions, InitializeParams, InitializeResult,
    InitializedParams, MessageType, OneOf, Position, Range, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextEdit, Url,
};
use tower_lsp::{async_trait, Client, LanguageServer, LspService, Server};

/// Settings section the client may nest the indenter options under.
const SETTINGS_SECTION: &str = "eraIndenter";

#[derive(Debug, Clone)]
struct DocumentState {
    text: String,
    version: i32,
    diagnostics: Diagnostics,
    pending: Option<PendingValidation>,
}

#[derive(Debug, Clone)]
struct PendingValidation {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct ServerState {
    documents: HashMap<Url, DocumentState>,
    config: IndenterConfig,
    next_task_id: u64,
}

struct EraLanguageServer {
    client: Client,
    state: Arc<Mutex<ServerState>>,
}

impl Clone for EraLanguageServer {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: self.state.clone(),
        }
    }
}

/// Read indenter options from a settings object, top level or under [`SETTINGS_SECTION`].
fn config_from_settings(settings: &Value) -> Option<Result<IndenterConfig>> {
    let section = settings.get(SETTINGS_SECTION).unwrap_or(settings);
    if !section.is_object() {
        return None;
    }
    Some(IndenterConfig::from_json_value(section.clone()).map_err(Into::into))
}

fn indent_unit_from(options: &FormattingOptions) -> IndentUnit {
    let width = usize::try_from(options.tab_size).unwrap_or(4).max(1);
    IndentUnit {
        width,
        use_spaces: options.insert_spaces,
    }
}

fn utf16_len(text: &str) -> u32 {
    u32::try_from(text.encode_utf16().count()).unwrap_or(u32::MAX)
}

fn lsp_line(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// The range covering the whole text of line `index`, terminator excluded.
fn whole_line(lines: &[Line], index: usize) -> Range {
    let end = lines.get(index).map(|line| utf16_len(&line.text)).unwrap_or(0);
    Range {
        start: Position {
            line: lsp_line(index),
            character: 0,
        },
        end: Position {
            line: lsp_line(index),
            character: end,
        },
    }
}

fn convert_edit(lines: &[Line], edit: &LineEdit) -> TextEdit {
    TextEdit {
        range: whole_line(lines, edit.line),
        new_text: edit.text.clone(),
    }
}

fn convert_diagnostic(lines: &[Line], diagnostic: &Diagnostic) -> LspDiagnostic {
    LspDiagnostic {
        range: whole_line(lines, diagnostic.line),
        severity: Some(DiagnosticSeverity::ERROR),
        code: None,
        code_description: None,
        source: Some("era-indenter".into()),
        message: diagnostic.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Document lines, padded so that line `through` exists.
fn document_lines(text: &str, through: usize) -> Vec<Line> {
    let mut lines = split_lines(text);
    while lines.len() <= through {
        lines.push(Line::new(lines.len(), ""));
    }
    lines
}

/// Edits for a newline typed on `new_line`: the regular pass plus the predicted indent.
fn newline_edits(indenter: &Indenter, outcome: &FormatOutcome, lines: &[Line], new_line: usize) -> Vec<TextEdit> {
    let blank = lines
        .get(new_line)
        .map(|line| line.text.trim().is_empty())
        .unwrap_or(true);
    let prediction = if blank { indenter.next_line() } else { None };
    let Some(prediction) = prediction else {
        return outcome
            .edits
            .iter()
            .map(|edit| convert_edit(lines, edit))
            .collect();
    };

    let opening = prediction.opening_line.as_ref().map(|edit| edit.line);
    let mut edits: Vec<TextEdit> = outcome
        .edits
        .iter()
        .filter(|edit| edit.line != new_line && Some(edit.line) != opening)
        .map(|edit| convert_edit(lines, edit))
        .collect();
    if let Some(edit) = &prediction.opening_line {
        edits.push(convert_edit(lines, edit));
    }
    edits.push(TextEdit {
        range: whole_line(lines, new_line),
        new_text: prediction.indent,
    });
    edits
}

impl EraLanguageServer {
    fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(ServerState::default())),
        }
    }

    async fn apply_settings(&self, settings: &Value) {
        match config_from_settings(settings) {
            Some(Ok(config)) => {
                let mut state = self.state.lock().await;
                state.config = config.with_indent_unit(state.config.indent_unit);
            }
            Some(Err(err)) => {
                self.client
                    .log_message(MessageType::ERROR, format!("ignoring settings: {err:#}"))
                    .await;
            }
            None => {}
        }
    }

    async fn upsert_document(&self, uri: &Url, text: String, version: i32) {
        let mut state = self.state.lock().await;
        let doc = state.documents.entry(uri.clone()).or_insert_with(|| DocumentState {
            text: String::new(),
            version,
            diagnostics: Diagnostics::new(),
            pending: None,
        });
        doc.text = text;
        doc.version = version;
    }

    async fn remove_document(&self, uri: &Url) {
        let mut state = self.state.lock().await;
        if let Some(doc) = state.documents.remove(uri) {
            if let Some(pending) = doc.pending {
                pending.token.cancel();
            }
        }
    }

    /// Text and effective configuration for a formatting request.
    async fn request_context(
        &self,
        uri: &Url,
        options: &FormattingOptions,
    ) -> Option<(String, IndenterConfig)> {
        let mut state = self.state.lock().await;
        let unit = indent_unit_from(options);
        state.config = state.config.with_indent_unit(unit);
        let config = state.config;
        state
            .documents
            .get(uri)
            .map(|doc| (doc.text.clone(), config))
    }

    /// Store the errors of a pass over lines `0..end` and publish the result.
    async fn publish_pass(&self, uri: &Url, lines: &[Line], end: usize, outcome: &FormatOutcome) {
        let (diagnostics, version) = {
            let mut state = self.state.lock().await;
            let Some(doc) = state.documents.get_mut(uri) else {
                return;
            };
            doc.diagnostics.replace_before(end, &outcome.errors);
            let diagnostics = doc
                .diagnostics
                .entries()
                .iter()
                .map(|diagnostic| convert_diagnostic(lines, diagnostic))
                .collect::<Vec<_>>();
            (diagnostics, doc.version)
        };

        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(version))
            .await;
    }

    async fn schedule_validation(&self, uri: Url, version: i32) {
        let (token, task_id) = {
            let mut state = self.state.lock().await;
            let task_id = state.next_task_id;
            state.next_task_id = state.next_task_id.saturating_add(1);
            let Some(doc) = state.documents.get_mut(&uri) else {
                return;
            };
            if let Some(pending) = doc.pending.take() {
                pending.token.cancel();
            }
            let token = CancellationToken::new();
            doc.pending = Some(PendingValidation {
                id: task_id,
                token: token.clone(),
            });
            (token, task_id)
        };

        let server = self.clone();
        task::spawn_local(async move {
            sleep(Duration::from_millis(150)).await;
            if token.is_cancelled() {
                server
                    .client
                    .log_message(MessageType::LOG, format!("validate:cancelled uri={uri}"))
                    .await;
                return;
            }
            server.run_validation(uri, version, task_id).await;
        });
    }

    async fn run_validation(&self, uri: Url, version: i32, task_id: u64) {
        let (text, config) = {
            let mut state = self.state.lock().await;
            let config = state.config;
            match state.documents.get_mut(&uri) {
                Some(doc)
                    if doc.version == version
                        && doc
                            .pending
                            .as_ref()
                            .map(|pending| pending.id == task_id)
                            .unwrap_or(false) =>
                {
                    doc.pending = None;
                    (doc.text.clone(), config)
                }
                _ => return,
            }
        };

        self.client
            .log_message(
                MessageType::LOG,
                format!("validate:start uri={uri} version={version} task={task_id}"),
            )
            .await;

        let lines = split_lines(&text);
        let outcome = format_lines(&lines, &config, 0..lines.len());
        tracing::debug!(%uri, errors = outcome.errors.len(), "validated document");
        self.publish_pass(&uri, &lines, lines.len(), &outcome).await;

        self.client
            .log_message(
                MessageType::LOG,
                format!("validate:finish uri={uri} version={version} task={task_id}"),
            )
            .await;
    }
}

#[async_trait]
impl LanguageServer for EraLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        if let Some(options) = params.initialization_options.as_ref() {
            self.apply_settings(options).await;
        }

        let mut triggers = TRIGGER_CHARACTERS.chars().rev().map(String::from);
        let first_trigger_character = triggers.next().unwrap_or_else(|| "\n".into());
        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            document_formatting_provider: Some(OneOf::Left(true)),
            document_range_formatting_provider: Some(OneOf::Left(true)),
            document_on_type_formatting_provider: Some(DocumentOnTypeFormattingOptions {
                first_trigger_character,
                more_trigger_character: Some(triggers.collect()),
            }),
            ..Default::default()
        };

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "era-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            capabilities,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "era indenter language server initialized")
            .await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.apply_settings(&params.settings).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        self.upsert_document(&uri, params.text_document.text, version)
            .await;
        self.schedule_validation(uri, version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let DidChangeTextDocumentParams {
            text_document,
            content_changes,
        } = params;
        let uri = text_document.uri;
        let version = text_document.version;

        // Full sync: the last change carries the whole document.
        let Some(change) = content_changes.into_iter().last() else {
            return;
        };
        if change.range.is_some() {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("received incremental change for {uri}; expected full sync"),
                )
                .await;
            return;
        }

        self.upsert_document(&uri, change.text, version).await;
        self.schedule_validation(uri, version).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.remove_document(&uri).await;
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn formatting(
        &self,
        params: DocumentFormattingParams,
    ) -> jsonrpc::Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        let Some((text, config)) = self.request_context(&uri, &params.options).await else {
            return Ok(None);
        };

        let lines = split_lines(&text);
        let outcome = format_lines(&lines, &config, 0..lines.len());
        self.client
            .log_message(
                MessageType::LOG,
                format!("format uri={uri} edits={}", outcome.edits.len()),
            )
            .await;
        self.publish_pass(&uri, &lines, lines.len(), &outcome).await;

        Ok(Some(
            outcome
                .edits
                .iter()
                .map(|edit| convert_edit(&lines, edit))
                .collect(),
        ))
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> jsonrpc::Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        let Some((text, config)) = self.request_context(&uri, &params.options).await else {
            return Ok(None);
        };

        let lines = split_lines(&text);
        let start = params.range.start.line as usize;
        let end = params.range.end.line as usize + 1;
        let outcome = format_lines(&lines, &config, start..end);
        self.client
            .log_message(
                MessageType::LOG,
                format!(
                    "format uri={uri} lines={start}..{end} edits={}",
                    outcome.edits.len()
                ),
            )
            .await;
        self.publish_pass(&uri, &lines, end, &outcome).await;

        Ok(Some(
            outcome
                .edits
                .iter()
                .map(|edit| convert_edit(&lines, edit))
                .collect(),
        ))
    }

    async fn on_type_formatting(
        &self,
        params: DocumentOnTypeFormattingParams,
    ) -> jsonrpc::Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some((text, config)) = self.request_context(&uri, &params.options).await else {
            return Ok(None);
        };

        let cursor_line = position.line as usize;
        let end = cursor_line + 1;
        let lines = document_lines(&text, cursor_line);
        let mut indenter = Indenter::new(config);
        let outcome = indenter.format(&lines, 0..end);
        self.publish_pass(&uri, &lines, end, &outcome).await;

        let edits = if params.ch == "\n" {
            newline_edits(&indenter, &outcome, &lines, cursor_line)
        } else {
            outcome
                .edits
                .iter()
                .map(|edit| convert_edit(&lines, edit))
                .collect()
        };
        Ok(Some(edits))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(EraLanguageServer::new);
    let server = Server::new(stdin, stdout, socket);
    let local = task::LocalSet::new();
    local
        .run_until(async move {
            server.serve(service).await;
        })
        .await;

    Ok(())
}
