//! CLI: check a schema, or coerce / dump documents against it.
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use json_coerce::schema::{self, Schema};
use json_coerce::{CoerceState, Coerced, Conversion, Data, Strictness, Type};

use crate::jq_exec::JqFilter;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// coerce loosely-typed JSON documents against a model schema and dump them back to wire form
#[derive(Parser, Debug)]
#[command(name = "json-coerce", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// load and validate a schema, then list its models
    Check(CheckCmd),
    /// coerce every document and report how well it fits
    Coerce(CoerceCmd),
    /// coerce every document, then dump it back as normalized JSON
    Dump(DumpCmd),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema description (.json)
    #[arg(long, short)]
    schema: PathBuf,

    /// model to coerce against (the schema's `root` if omitted)
    #[arg(long = "type", short = 't')]
    type_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// documents are keyed by field names rather than wire names
    #[arg(long, default_value_t = false)]
    native: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckCmd {
    /// schema description (.json)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug)]
struct CoerceCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// fail when any document scores a `no`
    #[arg(long, conflicts_with = "strict")]
    lenient: bool,

    /// fail when any document scores a `no` or a `maybe`
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct DumpCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document and where it came from.
#[derive(Debug)]
struct Document {
    origin: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<(Schema, Type)> {
        let schema = schema::load_path(&self.schema)?;
        let target = schema
            .target(self.type_name.as_deref())
            .ok_or_else(|| anyhow!("schema has no `root`; pass --type"))?;
        if let Type::Model(name) = &target {
            if schema.registry.get(name).is_none() {
                bail!("model `{name}` is not defined in {}", self.schema.display());
            }
        }
        Ok((schema, target))
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let jq = self.jq_expr.as_deref().map(JqFilter::compile).transpose()?;
        let source_paths = resolve_file_path_patterns(&self.input)?;

        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;

            let mut values = Vec::new();
            if self.ndjson {
                for (ix, line) in source.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
                    let value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse JSON line ({source_path_str}:{})", ix + 1))?;
                    values.push((format!("{source_path_str}:{}", ix + 1), value));
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                values.push((source_path_str.clone(), value));
            }

            for (origin, value) in values {
                let value = match self.json_pointer.as_deref() {
                    None => value,
                    Some(pointer) => value
                        .pointer(pointer)
                        .cloned()
                        .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {origin}"))?,
                };
                match jq.as_ref() {
                    None => out.push(Document { origin, value }),
                    Some(jq) => {
                        let results = jq
                            .run(&value)
                            .with_context(|| format!("failed to apply jq expression to {origin}"))?;
                        let many = results.len() > 1;
                        for (ix, value) in results.into_iter().enumerate() {
                            let origin = if many { format!("{origin}#{ix}") } else { origin.clone() };
                            out.push(Document { origin, value });
                        }
                    }
                }
            }
        }
        debug!(documents = out.len(), "loaded input documents");
        Ok(out)
    }

    fn initial_state(&self) -> CoerceState {
        if self.native { CoerceState::native() } else { CoerceState::new() }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => {
                let schema = schema::load_path(&target.schema)?;
                for model in schema.registry.models() {
                    let is_root = schema.root.as_deref() == Some(model.name());
                    let header = if is_root { format!("{} (root)", model.name()) } else { model.name().to_string() };
                    println!("{}", header.bold());
                    for (name, info) in model.properties() {
                        let mut flags = Vec::new();
                        if info.nullable { flags.push("nullable"); }
                        if info.optional { flags.push("optional"); }
                        let wire = if &info.wire_name == name { String::new() } else { format!(" ({})", info.wire_name) };
                        println!("  {name}{wire}: {} {}", info.ty.to_string().cyan(), flags.join(" ").dimmed());
                    }
                }
                info!(models = schema.registry.len(), "schema ok");
                Ok(ExitCode::SUCCESS)
            }
            Command::Coerce(target) => {
                let (schema, ty) = target.schema_settings.load()?;
                let documents = target.input_settings.load_documents()?;
                let cx = schema.registry.conversion();
                let policy = match (target.strict, target.lenient) {
                    (true, _) => Some(Strictness::Strict),
                    (_, true) => Some(Strictness::Lenient),
                    _ => None,
                };

                let results: Vec<Coerced> = documents
                    .par_iter()
                    .map(|doc| coerce_document(cx, &ty, doc, target.input_settings.initial_state()))
                    .collect();

                let mut rejected = 0usize;
                for (doc, Coerced { state, .. }) in documents.iter().zip(&results) {
                    let accepted = policy.is_none_or(|p| p.accepts(state));
                    if !accepted {
                        rejected += 1;
                    }
                    println!("{} {}", score_line(state, accepted), doc.origin);
                }
                if rejected > 0 {
                    eprintln!("{}", format!("{rejected} of {} documents rejected", documents.len()).red());
                    return Ok(ExitCode::FAILURE);
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Dump(target) => {
                let (schema, ty) = target.schema_settings.load()?;
                let documents = target.input_settings.load_documents()?;
                let cx = schema.registry.conversion();

                let mut dumped: Vec<Value> = documents
                    .par_iter()
                    .map(|doc| {
                        let Coerced { value, state } =
                            coerce_document(cx, &ty, doc, target.input_settings.initial_state());
                        if !state.is_clean() {
                            warn!(origin = %doc.origin, yes = state.yes, maybe = state.maybe, no = state.no, "imperfect fit");
                        }
                        cx.dump_value(&ty, &value).0
                    })
                    .collect();

                let rendered = if dumped.len() == 1 {
                    serde_json::to_string_pretty(&dumped.remove(0))?
                } else {
                    serde_json::to_string_pretty(&Value::Array(dumped))?
                };
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &rendered)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{rendered}");
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn coerce_document(cx: Conversion<'_>, ty: &Type, doc: &Document, mut state: CoerceState) -> Coerced {
    let value = cx.coerce(ty, Data::from(doc.value.clone()), &mut state);
    Coerced { value, state }
}

fn score_line(state: &CoerceState, accepted: bool) -> String {
    let scores = format!(
        "yes={:<4} maybe={:<4} no={:<4} branched={:<4}",
        state.yes, state.maybe, state.no, state.branched
    );
    let scores = if state.no > 0 {
        scores.red()
    } else if state.maybe > 0 {
        scores.yellow()
    } else {
        scores.green()
    };
    let verdict = if accepted { "ok".green() } else { "rejected".red().bold() };
    format!("{verdict:<8} {scores}")
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched_any = false;
        for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
            out.push(entry?);
            matched_any = true;
        }
        if !matched_any {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
