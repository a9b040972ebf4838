//! CLI: validate | join | subschema | concat over schema documents
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::info;

use crate::ir::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check, join, compare and combine JSON schema documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// report whether every input document is a well-formed schema
    Validate(ValidateCmd),
    /// print the least common generalization of all input schemas
    Join(JoinCmd),
    /// decide whether one schema is a subschema of another
    Subschema(SubschemaCmd),
    /// print the schema of concatenating the input datasets column-wise
    Concat(ConcatCmd),
}

/// How to pick the schema out of each parsed document.
#[derive(Args, Debug, Clone, Default)]
struct Selector {
    /// JSON Pointer to select a subnode in each document (e.g. /properties/X)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one schema
    #[arg(long)]
    jq_expr: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    #[command(flatten)]
    selector: Selector,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ValidateCmd {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct JoinCmd {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct SubschemaCmd {
    /// the candidate subschema
    #[arg(long)]
    sub: PathBuf,

    /// the candidate superschema
    #[arg(long)]
    sup: PathBuf,

    #[command(flatten)]
    selector: Selector,
}

#[derive(clap::Parser, Debug)]
struct ConcatCmd {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One schema document and where it came from.
#[derive(Debug, Clone)]
struct Document {
    origin: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Selector {
    fn apply(&self, origin: &str, value: Value) -> Result<Vec<Value>> {
        let value = match self.json_pointer.as_ref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .with_context(|| format!("JSON pointer `{pointer}` selects nothing in {origin}"))?,
        };
        match self.jq_expr.as_ref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &value)
                .with_context(|| format!("failed to apply jq expression to {origin}")),
        }
    }

    fn load_file(&self, path: &Path, ndjson: bool) -> Result<Vec<Document>> {
        let origin = path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {origin}"))?;
        let mut out = Vec::new();
        for (origin, value) in split_documents(&origin, &source, ndjson)? {
            for value in self.apply(&origin, value)? {
                out.push(Document { origin: origin.clone(), value });
            }
        }
        Ok(out)
    }

    fn load_single(&self, path: &Path) -> Result<Schema> {
        let mut docs = self.load_file(path, false)?;
        if docs.len() != 1 {
            bail!("expected exactly one schema in {}, found {}", path.display(), docs.len());
        }
        let doc = docs.remove(0);
        parse_checked(&doc)
    }
}

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            out.extend(self.selector.load_file(&source_path, self.ndjson)?);
        }
        info!(documents = out.len(), "loaded inputs");
        Ok(out)
    }

    /// Parse and validate every document, in parallel, keeping input order.
    fn load_schemas(&self) -> Result<Vec<Schema>> {
        let docs = self.load()?;
        docs.par_iter().map(parse_checked).collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Run the selected command. `Ok(false)` means the command completed
    /// but its verdict was negative.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Validate(target) => {
                let docs = target.input_settings.load()?;
                let verdicts: Vec<(&Document, Vec<String>)> = docs
                    .par_iter()
                    .map(|doc| (doc, problems(doc)))
                    .collect();
                let mut all_ok = true;
                for (doc, problems) in verdicts {
                    if problems.is_empty() {
                        println!("{} {}", "✅".green(), doc.origin);
                        continue;
                    }
                    all_ok = false;
                    println!("{} {}", "❌".red(), doc.origin.red());
                    for problem in problems {
                        println!("   {problem}");
                    }
                }
                Ok(all_ok)
            }
            Command::Join(target) => {
                let schemas = target.input_settings.load_schemas()?;
                let Some(joined) = crate::algebra::join_all(&schemas) else {
                    bail!("no input documents to join");
                };
                emit(target.out.as_deref(), &joined)?;
                Ok(true)
            }
            Command::Subschema(target) => {
                let sub = target.selector.load_single(&target.sub)?;
                let sup = target.selector.load_single(&target.sup)?;
                let verdict = crate::algebra::is_subschema(&sub, &sup);
                let (sub_name, sup_name) = (target.sub.display(), target.sup.display());
                if verdict {
                    println!("{} {sub_name} ⊑ {sup_name}", "✅".green());
                } else {
                    println!("{} {sub_name} ⋢ {sup_name}", "❌".red());
                }
                Ok(verdict)
            }
            Command::Concat(target) => {
                let schemas = target.input_settings.load_schemas()?;
                let combined = crate::shape::infer_combined_shape(&schemas);
                emit(target.out.as_deref(), &combined)?;
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Split one file into `(origin, document)` pairs; NDJSON origins carry the
/// line number.
fn split_documents(origin: &str, source: &str, ndjson: bool) -> Result<Vec<(String, Value)>> {
    if !ndjson {
        let value = serde_json::from_str::<Value>(source)
            .with_context(|| format!("failed to parse JSON source file ({origin})"))?;
        return Ok(vec![(origin.to_string(), value)]);
    }
    let mut out = Vec::new();
    for (ix, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_origin = format!("{origin}:{}", ix + 1);
        let value = serde_json::from_str::<Value>(line)
            .with_context(|| format!("failed to parse NDJSON line ({line_origin})"))?;
        out.push((line_origin, value));
    }
    Ok(out)
}

fn parse_checked(doc: &Document) -> Result<Schema> {
    let schema = Schema::from_value(doc.value.clone())
        .with_context(|| format!("invalid schema in {}", doc.origin))?;
    crate::validate::validate(&schema)
        .with_context(|| format!("invalid schema in {}", doc.origin))?;
    Ok(schema)
}

fn problems(doc: &Document) -> Vec<String> {
    match Schema::from_value(doc.value.clone()) {
        Ok(schema) => crate::validate::diagnose(&schema).iter().map(ToString::to_string).collect(),
        Err(error) => vec![error.to_string()],
    }
}

fn emit(out: Option<&Path>, schema: &Schema) -> Result<()> {
    let schema_src = serde_json::to_string_pretty(&schema.to_value())?;
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &schema_src)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{schema_src}"),
    }
    Ok(())
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

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matched nothing is almost always a typo
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
