use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use msk_editor_lib::command::{execute_json, CommandResponse};
use msk_editor_lib::state::{EditorSettings, UndoableModel};

fn main() {
    let settings = EditorSettings::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with_writer(io::stderr)
        .init();

    let mut editor = open_editor(parse_model_arg(), &settings);
    tracing::info!("editing {}", editor.document().recommended_title());

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("failed to read command: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = execute_json(&mut editor, &line).unwrap_or_else(CommandResponse::err);
        if response.success && settings.autosave.enabled && !editor.is_up_to_date_with_filesystem() {
            editor.autosave();
        }

        let out = serde_json::to_string(&response)
            .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"cannot encode response: {e}"}}"#));
        if writeln!(stdout, "{out}").and_then(|()| stdout.flush()).is_err() {
            break;
        }
    }
}

fn open_editor(model_path: Option<PathBuf>, settings: &EditorSettings) -> UndoableModel {
    let mut editor = model_path
        .and_then(|path| match msk_model::io::load_model(&path) {
            Ok(model) => match UndoableModel::from_model(model, settings.history) {
                Ok(editor) => {
                    tracing::info!("Loaded model from {}", path.display());
                    Some(editor)
                }
                Err(e) => {
                    tracing::error!("Model in {} is invalid: {e}", path.display());
                    None
                }
            },
            Err(e) => {
                tracing::error!("Failed to load model from {}: {e}", path.display());
                None
            }
        })
        .unwrap_or_else(|| {
            let mut editor = UndoableModel::new();
            editor.set_history_limits(settings.history);
            editor
        });
    editor.upd_document().set_scale_factor(settings.default_scale_factor);
    editor
}

fn parse_model_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--model" && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
        i += 1;
    }
    None
}
