// crates/truth-evidence-cli/src/main.rs
// ============================================================================
// Module: Truth Evidence CLI Entry Point
// Description: Command dispatcher for offline evidence and store workflows.
// Purpose: Hash, regenerate, verify, shadow-evaluate, and store evidence.
// Dependencies: clap, truth-evidence-core, truth-evidence-config,
// truth-evidence-store-sqlite, serde, thiserror.
// ============================================================================

//! ## Overview
//! The `truth-evidence` CLI runs the evidence engine against bundle files and
//! against the configured durable store. Offline commands never write
//! anywhere but stdout; store commands go through the engine facade so every
//! regeneration, verification, and shadow run is audited. Inputs are
//! untrusted: files are read with hard size limits and every document is
//! gated before it is evaluated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use truth_evidence_config::AuditConfig;
use truth_evidence_config::AuditSinkKind;
use truth_evidence_config::CONFIG_ENV_VAR;
use truth_evidence_config::TruthEvidenceConfig;
use truth_evidence_core::AuditSink;
use truth_evidence_core::EvidenceEngine;
use truth_evidence_core::EvidenceId;
use truth_evidence_core::EvidenceSealer;
use truth_evidence_core::EvidenceStore;
use truth_evidence_core::FileAuditSink;
use truth_evidence_core::HashDigest;
use truth_evidence_core::HashError;
use truth_evidence_core::MigrationRegistry;
use truth_evidence_core::NoopAuditSink;
use truth_evidence_core::OutputTruthMetadata;
use truth_evidence_core::Regenerator;
use truth_evidence_core::RulesetRegistry;
use truth_evidence_core::SealRequest;
use truth_evidence_core::ShadowEvaluator;
use truth_evidence_core::StderrAuditSink;
use truth_evidence_core::TenantKey;
use truth_evidence_core::Timestamp;
use truth_evidence_core::VerificationReport;
use truth_evidence_core::VerificationStatus;
use truth_evidence_core::Verifier;
use truth_evidence_core::hash_evidence_document;
use truth_evidence_core::hashing::canonical_json_bytes_with_limit;
use truth_evidence_core::runtime::GateClearance;
use truth_evidence_store_sqlite::MAX_BUNDLE_BYTES;
use truth_evidence_store_sqlite::SqliteEvidenceStore;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a bundle or seal request JSON input.
const MAX_INPUT_BYTES: usize = MAX_BUNDLE_BYTES;
/// Maximum size of canonical JSON written to stdout.
const MAX_OUTPUT_BYTES: usize = MAX_BUNDLE_BYTES * 2;
/// Field holding a document's identifier.
const EVIDENCE_ID_FIELD: &str = "evidenceId";
/// Field holding a document's embedded digest.
const BUNDLE_HASH_FIELD: &str = "bundleHash";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "truth-evidence", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Optional config file path (defaults to truth-evidence.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the canonical digest of a bundle file.
    Hash(BundleArgs),
    /// Regenerate the verdict of a bundle file under its pinned ruleset.
    Regenerate(BundleArgs),
    /// Verify a bundle file; exits non-zero on mismatch.
    Verify(BundleArgs),
    /// Evaluate a bundle file under the current ruleset without persisting.
    Shadow(ShadowCommand),
    /// Seal a request under the current ruleset and print the bundle.
    Seal(SealCommand),
    /// Ruleset registry utilities.
    Rulesets {
        /// Selected rulesets subcommand.
        #[command(subcommand)]
        command: RulesetsCommand,
    },
    /// Durable evidence store utilities.
    Store {
        /// Selected store subcommand.
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments naming a bundle file.
#[derive(Args, Debug)]
struct BundleArgs {
    /// Path to the evidence bundle JSON file.
    #[arg(value_name = "BUNDLE")]
    bundle: PathBuf,
}

/// Arguments for offline shadow evaluation.
#[derive(Args, Debug)]
struct ShadowCommand {
    /// Tenant key the evaluation is scoped to.
    #[arg(long, value_name = "TENANT")]
    tenant: String,
    /// Evaluation instant (RFC 3339); defaults to the wall clock.
    #[arg(long, value_name = "RFC3339")]
    evaluated_at: Option<String>,
    /// Path to the evidence bundle JSON file.
    #[arg(value_name = "BUNDLE")]
    bundle: PathBuf,
}

/// Arguments naming a seal request file.
#[derive(Args, Debug)]
struct SealCommand {
    /// Path to the seal request JSON file.
    #[arg(value_name = "REQUEST")]
    request: PathBuf,
}

/// Ruleset subcommands.
#[derive(Subcommand, Debug)]
enum RulesetsCommand {
    /// List registered rulesets.
    List,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Seal a request and append the bundle to the store.
    Put(SealCommand),
    /// Append an already sealed bundle file to the store.
    Import(BundleArgs),
    /// Print a stored bundle.
    Get(StoreIdArgs),
    /// Verify a stored bundle; exits non-zero on mismatch.
    Verify(StoreIdArgs),
    /// Regenerate the verdict of a stored bundle.
    Regenerate(StoreIdArgs),
    /// Shadow-evaluate a stored bundle for one tenant.
    Shadow(StoreShadowCommand),
    /// List stored bundles.
    List(StoreListCommand),
}

/// Arguments naming a stored bundle.
#[derive(Args, Debug)]
struct StoreIdArgs {
    /// Evidence identifier.
    #[arg(value_name = "EVIDENCE_ID")]
    evidence_id: String,
}

/// Arguments for stored-bundle shadow evaluation.
#[derive(Args, Debug)]
struct StoreShadowCommand {
    /// Tenant key the evaluation is scoped to.
    #[arg(long, value_name = "TENANT")]
    tenant: String,
    /// Evaluation instant (RFC 3339); defaults to the wall clock.
    #[arg(long, value_name = "RFC3339")]
    evaluated_at: Option<String>,
    /// Evidence identifier.
    #[arg(value_name = "EVIDENCE_ID")]
    evidence_id: String,
}

/// Arguments for listing stored bundles.
#[derive(Args, Debug)]
struct StoreListCommand {
    /// Restrict the listing to one tenant.
    #[arg(long, value_name = "TENANT")]
    tenant: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Output of the `hash` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HashReport {
    /// Document identifier, when present.
    evidence_id: Option<String>,
    /// Digest computed over the document without `bundleHash`.
    bundle_hash: HashDigest,
    /// True when the embedded digest equals the computed one; absent when the
    /// document carries no digest.
    #[serde(skip_serializing_if = "Option::is_none")]
    matches_embedded: Option<bool>,
}

/// Output of the regenerate commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegenerationReport<'a> {
    /// Regenerated bundle.
    evidence_id: &'a EvidenceId,
    /// Gate outcome, including the pinned ruleset.
    clearance: &'a GateClearance,
    /// Freshly computed verdict.
    verdict: &'a OutputTruthMetadata,
}

/// Output of store write commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreWriteReport<'a> {
    /// Written bundle.
    evidence_id: &'a EvidenceId,
    /// True when the bundle was written; false when the id already existed.
    inserted: bool,
    /// Digest of the document the store holds under the id.
    bundle_hash: &'a HashDigest,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("truth-evidence {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config_path = cli.config.as_deref();
    match command {
        Commands::Hash(command) => command_hash(&command),
        Commands::Regenerate(command) => command_regenerate(config_path, &command),
        Commands::Verify(command) => command_verify(config_path, &command),
        Commands::Shadow(command) => command_shadow(config_path, &command),
        Commands::Seal(command) => command_seal(config_path, &command),
        Commands::Rulesets {
            command,
        } => command_rulesets(config_path, &command),
        Commands::Store {
            command,
        } => command_store(config_path, command),
        Commands::Config {
            command,
        } => command_config(config_path, &command),
    }
}

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Offline Commands
// ============================================================================

/// Executes the `hash` command.
fn command_hash(command: &BundleArgs) -> CliResult<ExitCode> {
    let document = read_json_document(&command.bundle, "bundle")?;
    let bundle_hash = hash_evidence_document(&document)
        .map_err(|err| CliError::new(format!("failed to hash bundle: {err}")))?;
    let computed = serde_json::to_value(&bundle_hash)
        .map_err(|err| CliError::new(format!("failed to encode digest: {err}")))?;
    let matches_embedded = document.get(BUNDLE_HASH_FIELD).map(|embedded| embedded == &computed);
    let report = HashReport {
        evidence_id: document.get(EVIDENCE_ID_FIELD).and_then(Value::as_str).map(str::to_string),
        bundle_hash,
        matches_embedded,
    };
    write_canonical_json(&report)?;
    Ok(if matches_embedded == Some(false) { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Executes the offline `regenerate` command.
fn command_regenerate(config_path: Option<&Path>, command: &BundleArgs) -> CliResult<ExitCode> {
    let registries = OfflineRegistries::load(config_path)?;
    let document = read_json_document(&command.bundle, "bundle")?;
    let regeneration = Regenerator::new(&registries.rulesets, &registries.migrations)
        .replay(&document)
        .map_err(|err| CliError::new(format!("regeneration failed: {err}")))?;
    write_canonical_json(&RegenerationReport {
        evidence_id: &regeneration.bundle.evidence_id,
        clearance: &regeneration.clearance,
        verdict: &regeneration.verdict,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the offline `verify` command.
fn command_verify(config_path: Option<&Path>, command: &BundleArgs) -> CliResult<ExitCode> {
    let registries = OfflineRegistries::load(config_path)?;
    let document = read_json_document(&command.bundle, "bundle")?;
    let report = Verifier::new(Regenerator::new(&registries.rulesets, &registries.migrations))
        .verify_document(&document)
        .map_err(|err| CliError::new(format!("verification failed: {err}")))?;
    write_verification_report(&report)
}

/// Executes the offline `shadow` command.
fn command_shadow(config_path: Option<&Path>, command: &ShadowCommand) -> CliResult<ExitCode> {
    let registries = OfflineRegistries::load(config_path)?;
    let document = read_json_document(&command.bundle, "bundle")?;
    let evaluated_at = resolve_evaluated_at(command.evaluated_at.as_deref())?;
    let result = ShadowEvaluator::new(&registries.rulesets, &registries.migrations)
        .evaluate_shadow_document(&TenantKey::new(command.tenant.as_str()), &document, evaluated_at)
        .map_err(|err| CliError::new(format!("shadow evaluation failed: {err}")))?;
    write_canonical_json(&result)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the offline `seal` command.
fn command_seal(config_path: Option<&Path>, command: &SealCommand) -> CliResult<ExitCode> {
    let registries = OfflineRegistries::load(config_path)?;
    let request: SealRequest = read_json(&command.request, "seal request")?;
    let bundle = EvidenceSealer::new(&registries.rulesets)
        .seal(request)
        .map_err(|err| CliError::new(format!("sealing failed: {err}")))?;
    write_canonical_json(&bundle)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `rulesets` commands.
fn command_rulesets(config_path: Option<&Path>, command: &RulesetsCommand) -> CliResult<ExitCode> {
    match command {
        RulesetsCommand::List => {
            let registries = OfflineRegistries::load(config_path)?;
            let summaries = registries
                .rulesets
                .summaries()
                .map_err(|err| CliError::new(format!("failed to list rulesets: {err}")))?;
            write_canonical_json(&summaries)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the `config` commands.
fn command_config(config_path: Option<&Path>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            TruthEvidenceConfig::load(config_path)
                .map_err(|err| CliError::new(format!("config validation failed: {err}")))?;
            write_stdout_line("config valid")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Executes the `store` commands against the configured durable store.
fn command_store(config_path: Option<&Path>, command: StoreCommand) -> CliResult<ExitCode> {
    let engine = open_engine(config_path)?;
    match command {
        StoreCommand::Put(command) => {
            let request: SealRequest = read_json(&command.request, "seal request")?;
            let outcome = engine
                .seal_and_store(request)
                .map_err(|err| CliError::new(format!("store put failed: {err}")))?;
            write_canonical_json(&StoreWriteReport {
                evidence_id: &outcome.bundle.evidence_id,
                inserted: outcome.inserted,
                bundle_hash: &outcome.stored_hash,
            })?;
            Ok(ExitCode::SUCCESS)
        }
        StoreCommand::Import(command) => store_import(&engine, &command.bundle),
        StoreCommand::Get(command) => {
            let document = engine
                .load_document(&EvidenceId::new(command.evidence_id))
                .map_err(|err| CliError::new(format!("store get failed: {err}")))?;
            write_canonical_json(&document)?;
            Ok(ExitCode::SUCCESS)
        }
        StoreCommand::Verify(command) => {
            let report = engine
                .verify(&EvidenceId::new(command.evidence_id))
                .map_err(|err| CliError::new(format!("store verify failed: {err}")))?;
            write_verification_report(&report)
        }
        StoreCommand::Regenerate(command) => {
            let regeneration = engine
                .regenerate(&EvidenceId::new(command.evidence_id))
                .map_err(|err| CliError::new(format!("store regenerate failed: {err}")))?;
            write_canonical_json(&RegenerationReport {
                evidence_id: &regeneration.bundle.evidence_id,
                clearance: &regeneration.clearance,
                verdict: &regeneration.verdict,
            })?;
            Ok(ExitCode::SUCCESS)
        }
        StoreCommand::Shadow(command) => {
            let evaluated_at = resolve_evaluated_at(command.evaluated_at.as_deref())?;
            let result = engine
                .shadow(
                    &TenantKey::new(command.tenant),
                    &EvidenceId::new(command.evidence_id),
                    evaluated_at,
                )
                .map_err(|err| CliError::new(format!("store shadow failed: {err}")))?;
            write_canonical_json(&result)?;
            Ok(ExitCode::SUCCESS)
        }
        StoreCommand::List(command) => {
            let tenant = command.tenant.map(TenantKey::new);
            let bundles = engine
                .store()
                .list_bundles(tenant.as_ref())
                .map_err(|err| CliError::new(format!("store list failed: {err}")))?;
            write_canonical_json(&bundles)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Appends a sealed bundle file after checking its embedded digest.
fn store_import(
    engine: &EvidenceEngine<SqliteEvidenceStore>,
    path: &Path,
) -> CliResult<ExitCode> {
    let document = read_json_document(path, "bundle")?;
    let evidence_id = document
        .get(EVIDENCE_ID_FIELD)
        .and_then(Value::as_str)
        .map(EvidenceId::new)
        .ok_or_else(|| CliError::new("bundle is missing evidenceId".to_string()))?;
    let computed = hash_evidence_document(&document)
        .map_err(|err| CliError::new(format!("failed to hash bundle: {err}")))?;
    if let Some(embedded) = document.get(BUNDLE_HASH_FIELD) {
        let computed_value = serde_json::to_value(&computed)
            .map_err(|err| CliError::new(format!("failed to encode digest: {err}")))?;
        if embedded != &computed_value {
            return Err(CliError::new(format!(
                "bundle {evidence_id} hash does not match its contents; refusing to import"
            )));
        }
    }
    let outcome = engine
        .store()
        .append_if_absent(&evidence_id, &document)
        .map_err(|err| CliError::new(format!("store import failed: {err}")))?;
    let stored_hash = if outcome.inserted {
        computed
    } else {
        engine
            .stored_digest(&evidence_id)
            .map_err(|err| CliError::new(format!("store import failed: {err}")))?
    };
    write_canonical_json(&StoreWriteReport {
        evidence_id: &evidence_id,
        inserted: outcome.inserted,
        bundle_hash: &stored_hash,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Engine Wiring
// ============================================================================

/// Registries used by offline commands.
struct OfflineRegistries {
    /// Ruleset registry with the configured current version.
    rulesets: RulesetRegistry,
    /// Built-in schema migrations.
    migrations: MigrationRegistry,
}

impl OfflineRegistries {
    /// Builds registries, honoring a config file only when one is named.
    fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let config = if config_path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some() {
            load_config(config_path)?
        } else {
            TruthEvidenceConfig::default()
        };
        Ok(Self {
            rulesets: build_rulesets(&config)?,
            migrations: build_migrations()?,
        })
    }
}

/// Loads and validates configuration.
fn load_config(config_path: Option<&Path>) -> CliResult<TruthEvidenceConfig> {
    TruthEvidenceConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds the ruleset registry and applies the configured current version.
fn build_rulesets(config: &TruthEvidenceConfig) -> CliResult<RulesetRegistry> {
    let rulesets = RulesetRegistry::builtin()
        .map_err(|err| CliError::new(format!("failed to build rulesets: {err}")))?;
    if let Some(version) = config.rulesets.current_version() {
        rulesets
            .set_current(&version)
            .map_err(|err| CliError::new(format!("failed to select ruleset: {err}")))?;
    }
    Ok(rulesets)
}

/// Builds the built-in migration registry.
fn build_migrations() -> CliResult<MigrationRegistry> {
    MigrationRegistry::builtin()
        .map_err(|err| CliError::new(format!("failed to build migrations: {err}")))
}

/// Builds the configured audit sink.
fn build_audit_sink(config: &AuditConfig) -> CliResult<Arc<dyn AuditSink>> {
    match config.sink {
        AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| CliError::new("file audit sink requires path".to_string()))?;
            let sink = FileAuditSink::new(path).map_err(|err| {
                CliError::new(format!("failed to open audit log {}: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
    }
}

/// Opens the engine over the configured `SQLite` store.
fn open_engine(config_path: Option<&Path>) -> CliResult<EvidenceEngine<SqliteEvidenceStore>> {
    let config = load_config(config_path)?;
    let store_config = config.sqlite_store_config().ok_or_else(|| {
        CliError::new(
            "store commands require a sqlite store; memory stores do not persist between runs"
                .to_string(),
        )
    })?;
    let store = SqliteEvidenceStore::new(store_config)
        .map_err(|err| CliError::new(format!("failed to open evidence store: {err}")))?;
    let audit = build_audit_sink(&config.audit)?;
    Ok(EvidenceEngine::new(build_rulesets(&config)?, build_migrations()?, store, audit)
        .with_max_bundle_bytes(config.limits.max_bundle_bytes))
}

/// Parses the evaluation instant or reads the wall clock.
fn resolve_evaluated_at(text: Option<&str>) -> CliResult<Timestamp> {
    if let Some(text) = text {
        return Timestamp::parse_rfc3339(text)
            .map_err(|err| CliError::new(format!("invalid --evaluated-at: {err}")));
    }
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::new(format!("system clock before unix epoch: {err}")))?;
    let seconds = i64::try_from(elapsed.as_secs())
        .map_err(|_| CliError::new("system clock out of range".to_string()))?;
    Timestamp::from_unix_seconds(seconds)
        .map_err(|err| CliError::new(format!("invalid evaluation time: {err}")))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and decodes a JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path, kind: &str) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {kind} {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} {} is too large ({size} bytes, limit {limit})",
            path.display()
        )),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid {kind} json {}: {err}", path.display())))
}

/// Reads a JSON document without typing it, so historical schemas stay loadable.
fn read_json_document(path: &Path, kind: &str) -> CliResult<Value> {
    read_json(path, kind)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a verification report and maps its status to the exit code.
fn write_verification_report(report: &VerificationReport) -> CliResult<ExitCode> {
    write_canonical_json(report)?;
    Ok(match report.status {
        VerificationStatus::Pass => ExitCode::SUCCESS,
        VerificationStatus::Fail => ExitCode::FAILURE,
    })
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes canonical JSON to stdout with a size limit.
fn write_canonical_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let mut bytes = canonical_json_bytes_with_limit(value, MAX_OUTPUT_BYTES).map_err(|err| {
        let message = match err {
            HashError::Canonicalization(error) => format!("failed to encode output: {error}"),
            HashError::SizeLimitExceeded {
                limit,
                actual,
            } => format!("output exceeds size limit ({actual} > {limit})"),
        };
        CliError::new(message)
    })?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
