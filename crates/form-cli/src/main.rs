mod wizard;

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use form_client::{
    ApiConfig, BASE_URL_ENV, FormClient, LoadOutcome, SchemaLoader, upload_session_files,
};
use form_spec::input::option_text;
use form_spec::{
    Control, Field, FieldValue, FormSession, FormVersion, InputError, PartBody, PayloadEncoding,
    SubmitState, ValidationErrors, Values, build_render_payload, initial_values, parse_input,
    render_json_ui, render_text, toggle_option, values_from_json,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use wizard::{PromptContext, Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Dynamic form CLI",
    long_about = "Derives conditional field state, validates, renders and submits dynamic form versions"
)]
struct Cli {
    /// Base URL of the form API.
    #[arg(long, global = true, env = BASE_URL_ENV, value_name = "URL")]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the derived visibility/required maps and the visible field ids.
    State {
        /// Path to the form version JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Optional JSON file with field values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
    },
    /// Validate values against the visible required fields.
    Validate {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Render the form for the given values.
    Render {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Preview the submission body.
    Payload {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
    },
    /// Print the initial value of every field.
    Defaults {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Print the JSON Schema of a form version document.
    Schema,
    /// Fetch a form version from the API.
    Fetch {
        #[arg(long, value_name = "ID")]
        version: u64,
        /// Write the version to a file instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Validate and submit values to the API.
    Submit {
        #[arg(long, value_name = "ID")]
        version: u64,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        /// Use a local form version instead of fetching it.
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        /// Upload file values first and submit the returned identifiers.
        #[arg(long)]
        upload_files: bool,
    },
    /// Fill a form interactively, field by field.
    Fill {
        #[arg(long, value_name = "SPEC", conflicts_with = "version", required_unless_present = "version")]
        spec: Option<PathBuf>,
        #[arg(long, value_name = "ID")]
        version: Option<u64>,
        /// Optional JSON file with starting values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Submit to the API once every visible required field is filled.
        #[arg(long)]
        submit: bool,
        /// Show verbose output (status, visible fields, choices).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also print the submission body as JSON when done.
        #[arg(long)]
        answers_json: bool,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(cli.base_url);
    match cli.command {
        Command::State { spec, values } => run_state(&spec, values.as_deref()),
        Command::Validate { spec, values } => run_validate(&spec, &values),
        Command::Render {
            spec,
            values,
            format,
        } => run_render(&spec, values.as_deref(), format),
        Command::Payload { spec, values } => run_payload(&spec, values.as_deref()),
        Command::Defaults { spec } => run_defaults(&spec),
        Command::Schema => run_schema(),
        Command::Fetch { version, out } => run_fetch(config, version, out).await,
        Command::Submit {
            version,
            values,
            spec,
            upload_files,
        } => run_submit(config, version, &values, spec.as_deref(), upload_files).await,
        Command::Fill {
            spec,
            version,
            values,
            submit,
            verbose,
            answers_json,
        } => {
            run_fill(
                config,
                spec.as_deref(),
                version,
                values.as_deref(),
                submit,
                verbose,
                answers_json,
            )
            .await
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(base_url: Option<String>) -> ApiConfig {
    base_url
        .filter(|url| !url.trim().is_empty())
        .map(|url| ApiConfig::new(url.trim()))
        .unwrap_or_default()
}

fn load_version(path: &Path) -> CliResult<FormVersion> {
    let contents = fs::read_to_string(path)?;
    let body: Value = serde_json::from_str(&contents)?;
    Ok(FormVersion::from_response(body)?)
}

fn load_values(path: &Path) -> CliResult<Values> {
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    Ok(values_from_json(value)?)
}

fn load_session(spec_path: &Path, values_path: Option<&Path>) -> CliResult<FormSession> {
    let mut session = FormSession::new(load_version(spec_path)?);
    if let Some(path) = values_path {
        session.set_values(load_values(path)?);
    }
    Ok(session)
}

async fn fetch_remote(client: &FormClient, version_id: u64) -> CliResult<FormVersion> {
    let mut loader = SchemaLoader::new(client.clone());
    loader.request(version_id);
    match loader.wait().await {
        LoadOutcome::Loaded(version) => Ok(version),
        LoadOutcome::Failed(err) => {
            Err(format!("failed to load form version {}: {}", version_id, err).into())
        }
        LoadOutcome::Cancelled => Err("form version load was cancelled".into()),
    }
}

fn run_state(spec_path: &Path, values_path: Option<&Path>) -> CliResult<()> {
    let session = load_session(spec_path, values_path)?;
    let state = session.field_state();
    let visible = session.visible_fields();
    let visible_ids = session
        .fields()
        .filter(|field| visible.contains(&field.id))
        .map(|field| field.id.as_str())
        .collect::<Vec<_>>();
    let output = json!({
        "visibility": state.visibility,
        "required": state.required,
        "visible_fields": visible_ids,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_validate(spec_path: &Path, values_path: &Path) -> CliResult<()> {
    let session = load_session(spec_path, Some(values_path))?;
    let errors = session.check();
    println!(
        "Validation result: {}",
        if errors.is_empty() { "valid" } else { "invalid" }
    );
    if errors.is_empty() {
        Ok(())
    } else {
        describe_errors(&errors);
        Err("validation failed".into())
    }
}

fn describe_errors(errors: &ValidationErrors) {
    println!("Errors:");
    for (field_id, message) in errors {
        println!("  {} - {}", field_id, message);
    }
}

fn run_render(spec_path: &Path, values_path: Option<&Path>, mode: RenderMode) -> CliResult<()> {
    let session = load_session(spec_path, values_path)?;
    let payload = build_render_payload(&session);
    match mode {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render_json_ui(&payload))?
        ),
    }
    Ok(())
}

fn run_payload(spec_path: &Path, values_path: Option<&Path>) -> CliResult<()> {
    let session = load_session(spec_path, values_path)?;
    let payload = session.payload();
    match payload.encoding() {
        PayloadEncoding::Json => println!("{}", serde_json::to_string_pretty(&payload.to_json())?),
        PayloadEncoding::Multipart => {
            println!("multipart/form-data");
            for part in payload.multipart_parts() {
                match part.body {
                    PartBody::Text(text) => println!("{} = {}", part.name, text),
                    PartBody::File(handle) => {
                        println!("{} = @{}", part.name, handle.path.display())
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_defaults(spec_path: &Path) -> CliResult<()> {
    let version = load_version(spec_path)?;
    let defaults = initial_values(version.fields());
    println!("{}", serde_json::to_string_pretty(&defaults)?);
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormVersion);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn run_fetch(config: ApiConfig, version_id: u64, out: Option<PathBuf>) -> CliResult<()> {
    let client = FormClient::new(config)?;
    let version = fetch_remote(&client, version_id).await?;
    let pretty = serde_json::to_string_pretty(&version)?;
    match out {
        Some(path) => {
            fs::write(&path, pretty)?;
            println!("Saved form version {} to {}", version.id, path.display());
        }
        None => println!("{}", pretty),
    }
    Ok(())
}

async fn run_submit(
    config: ApiConfig,
    version_id: u64,
    values_path: &Path,
    spec_path: Option<&Path>,
    upload_files: bool,
) -> CliResult<()> {
    let client = FormClient::new(config)?;
    let version = match spec_path {
        Some(path) => load_version(path)?,
        None => fetch_remote(&client, version_id).await?,
    };
    if version.id != version_id {
        let source = spec_path.map_or_else(
            || "fetched schema".to_string(),
            |path| path.display().to_string(),
        );
        return Err(format!(
            "{} declares form version {}, not {}",
            source, version.id, version_id
        )
        .into());
    }
    let mut session = FormSession::new(version);
    session.set_values(load_values(values_path)?);
    submit_session(&client, version_id, &mut session, upload_files).await?;
    print_submit_state(session.submit_state())
}

/// Uploads files when asked, validates, posts and records the outcome on
/// the session.
async fn submit_session(
    client: &FormClient,
    version_id: u64,
    session: &mut FormSession,
    upload_files: bool,
) -> CliResult<()> {
    if upload_files {
        let failed = upload_session_files(client, session).await;
        if !failed.is_empty() {
            for field_id in &failed {
                eprintln!(
                    "Upload failed for {}: {}",
                    field_id,
                    session.error(field_id).unwrap_or("unknown error")
                );
            }
            return Err("file upload failed".into());
        }
    }

    let payload = match session.begin_submit() {
        Ok(payload) => payload,
        Err(errors) => {
            describe_errors(&errors);
            return Err("validation failed".into());
        }
    };
    let outcome = client.submit(version_id, &payload).await;
    session.finish_submit(outcome.map_err(|err| err.to_string()));
    Ok(())
}

fn print_submit_state(state: &SubmitState) -> CliResult<()> {
    match state {
        SubmitState::Succeeded {
            message,
            redirect_url,
        } => {
            println!("Submitted: {}", message);
            if let Some(url) = redirect_url {
                println!("Redirect: {}", url);
            }
            Ok(())
        }
        SubmitState::Failed { message } => Err(format!("submission failed: {}", message).into()),
        SubmitState::Idle | SubmitState::Submitting => Err("submission did not complete".into()),
    }
}

async fn run_fill(
    config: ApiConfig,
    spec_path: Option<&Path>,
    version_id: Option<u64>,
    values_path: Option<&Path>,
    submit: bool,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let client = FormClient::new(config)?;
    let version = match (spec_path, version_id) {
        (Some(path), _) => load_version(path)?,
        (None, Some(id)) => fetch_remote(&client, id).await?,
        (None, None) => return Err("either --spec or --version is required".into()),
    };
    let target_version = version_id.unwrap_or(version.id);
    let mut session = FormSession::new(version);
    if let Some(path) = values_path {
        session.set_values(load_values(path)?);
    }

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        fill_session(&mut session, &mut presenter, &mut input)?;
    }
    presenter.show_completion(&session);

    if submit {
        submit_session(&client, target_version, &mut session, false).await?;
        presenter.show_submit_state(session.submit_state());
        if let SubmitState::Failed { message } = session.submit_state() {
            return Err(format!("submission failed: {}", message).into());
        }
    }
    Ok(())
}

enum Answer {
    Value(FieldValue),
    Keep,
    Reset,
}

/// Prompts every visible field once, in declaration order. Field state is
/// re-derived after each answer, so fields revealed by an answer are asked
/// next and fields hidden by it are skipped.
fn fill_session<R: BufRead>(
    session: &mut FormSession,
    presenter: &mut WizardPresenter,
    input: &mut R,
) -> CliResult<()> {
    let mut answered: BTreeSet<String> = BTreeSet::new();
    loop {
        let payload = build_render_payload(session);
        presenter.show_header(&payload);

        let next = payload
            .fields
            .iter()
            .find(|field| field.visible && !answered.contains(&field.id));
        let Some(render) = next else {
            let errors = session.check();
            if errors.is_empty() {
                return Ok(());
            }
            presenter.show_errors(&errors);
            for field_id in errors.keys() {
                answered.remove(field_id);
            }
            continue;
        };

        presenter.show_status(&payload);
        let field = session
            .version()
            .field(&render.id)
            .cloned()
            .ok_or_else(|| format!("field '{}' not found", render.id))?;
        let visible = payload.fields.iter().filter(|field| field.visible);
        let total = visible.clone().count();
        let index = visible
            .filter(|field| answered.contains(&field.id))
            .count()
            + 1;
        let prompt = PromptContext::new(&field, render, index, total);

        match prompt_field(&prompt, &field, session, presenter, input)? {
            Answer::Value(value) => {
                session.set_value(field.id.clone(), value);
                answered.insert(field.id);
            }
            Answer::Keep => {
                answered.insert(field.id);
            }
            Answer::Reset => {
                session.reset();
                answered.clear();
                presenter.show_reset();
            }
        }
    }
}

fn prompt_field<R: BufRead>(
    prompt: &PromptContext,
    field: &Field,
    session: &FormSession,
    presenter: &WizardPresenter,
    input: &mut R,
) -> CliResult<Answer> {
    let current = session.value(&field.id).cloned().unwrap_or_default();
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("input closed before the form was complete".into());
        }

        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }
        if trimmed.eq_ignore_ascii_case("reset") {
            return Ok(Answer::Reset);
        }
        if trimmed.is_empty() {
            if !form_spec::is_empty_value(Some(&current)) {
                return Ok(Answer::Keep);
            }
            if prompt.required {
                presenter.show_required(&prompt.label);
                continue;
            }
        }

        match parse_answer(field, &current, trimmed) {
            Ok(value) => return Ok(Answer::Value(value)),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Checkbox groups also accept `+value`/`-value` to toggle one option.
fn parse_answer(field: &Field, current: &FieldValue, raw: &str) -> Result<FieldValue, InputError> {
    if field.control() == Control::CheckboxGroup
        && let Some((checked, wanted)) = raw
            .strip_prefix('+')
            .map(|rest| (true, rest))
            .or_else(|| raw.strip_prefix('-').map(|rest| (false, rest)))
    {
        let wanted = wanted.trim();
        let option = field
            .options
            .iter()
            .find(|option| option_text(&option.value) == wanted || option.label == wanted)
            .ok_or_else(|| InputError::UnknownOption {
                raw: wanted.to_string(),
                options: field
                    .options
                    .iter()
                    .map(|option| option_text(&option.value))
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        return Ok(toggle_option(current, &option.value, checked));
    }
    parse_input(field, raw)
}
