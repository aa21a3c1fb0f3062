//! `note-rewrite` — command-line transport for the rewrite core.
//!
//! Reads a request (flags, a JSON file, or `-` for stdin), runs it through
//! `RewriteService`, and prints the response payload as JSON on stdout.
//! Exit code 0 when the payload status is 2xx, 1 otherwise.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use note_rewrite_lib::config;
use note_rewrite_lib::llm::{actions, prompts, provider, voice, Action, ProviderId, RewriteRequest};
use note_rewrite_lib::{RewriteService, Settings};

#[derive(Debug, Parser)]
#[command(name = "note-rewrite", about = "Rewrite a selected passage with an LLM")]
struct Cli {
    /// Request JSON file, or "-" for stdin
    #[arg(long, conflicts_with_all = ["action", "selection"])]
    request: Option<PathBuf>,

    /// rewrite | shorter | clearer | fix | tone | expand | bullets | example
    #[arg(long)]
    action: Option<String>,

    /// Tone for the `tone` action (e.g. "friendly")
    #[arg(long)]
    tone: Option<String>,

    /// The selected passage
    #[arg(long)]
    selection: Option<String>,

    #[arg(long)]
    title: Option<String>,

    /// File holding the full note body
    #[arg(long)]
    document: Option<PathBuf>,

    /// Text right before the selection
    #[arg(long)]
    before: Option<String>,

    /// Text right after the selection
    #[arg(long)]
    after: Option<String>,

    /// User id whose stored voice profile should be applied
    #[arg(long, env = "NOTE_REWRITE_USER")]
    user: Option<String>,

    /// Print the compiled prompt instead of calling the generator
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    list_actions: bool,

    #[arg(long)]
    list_providers: bool,

    /// Store an API key (read from stdin) in the OS keychain for this provider
    #[arg(long, value_name = "PROVIDER")]
    save_key: Option<ProviderId>,
}

#[tokio::main]
async fn main() -> ExitCode {
    note_rewrite_lib::init();
    let cli = Cli::parse();

    if cli.list_actions {
        for action in Action::ALL {
            let t = actions::resolve(action, Some("neutral"));
            println!(
                "{:<8} alternatives={} temperature={:.1} max_tokens={}",
                action.as_str(),
                t.expected_alternatives,
                t.temperature,
                t.max_output_tokens
            );
        }
        return ExitCode::SUCCESS;
    }

    if cli.list_providers {
        return print_json(&provider::all_providers());
    }

    if let Some(provider) = cli.save_key {
        return save_key(provider);
    }

    let request = match build_request(&cli) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[CLI] {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.dry_run {
        return dry_run(request);
    }

    let settings = Settings::from_env();
    let service = match RewriteService::from_settings(settings) {
        Ok(s) => s.with_voice_profiles(Box::new(voice::FileVoiceProfileStore::default_location())),
        Err(e) => {
            eprintln!("[CLI] {}", e);
            return ExitCode::FAILURE;
        }
    };

    let response = service.handle_request(request, cli.user.as_deref()).await;
    let printed = print_json(&response.body);
    if response.is_success() {
        printed
    } else {
        ExitCode::FAILURE
    }
}

fn build_request(cli: &Cli) -> Result<RewriteRequest, String> {
    if let Some(path) = &cli.request {
        let raw = if path.to_str() == Some("-") {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buf
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
        };
        return serde_json::from_str(&raw).map_err(|e| format!("Invalid request JSON: {}", e));
    }

    let document_body = match &cli.document {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        ),
        None => None,
    };

    Ok(RewriteRequest {
        action: cli.action.clone(),
        tone_value: cli.tone.clone(),
        document_title: cli.title.clone(),
        document_body,
        selected_text: cli.selection.clone(),
        context_before: cli.before.clone(),
        context_after: cli.after.clone(),
        voice_profile: None,
    })
}

fn dry_run(request: RewriteRequest) -> ExitCode {
    let edit = match request.validate() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("[CLI] {}", e);
            return ExitCode::FAILURE;
        }
    };
    let template = actions::resolve(edit.action, edit.tone_value.as_deref());
    let prompt = prompts::compile(&edit, &template);
    print_json(&serde_json::json!({
        "fingerprint": prompt.fingerprint(),
        "temperature": template.temperature,
        "maxOutputTokens": template.max_output_tokens,
        "system": prompt.system,
        "userMessage": prompt.user_message,
    }))
}

fn save_key(provider: ProviderId) -> ExitCode {
    let mut key = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut key) {
        eprintln!("[CLI] Failed to read key from stdin: {}", e);
        return ExitCode::FAILURE;
    }
    let key = key.trim();
    if key.is_empty() {
        eprintln!("[CLI] Empty key on stdin");
        return ExitCode::FAILURE;
    }
    match config::save_api_key(provider, key) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[CLI] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[CLI] Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}
