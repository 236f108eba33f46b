use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use lex_diff::{DiffConfig, FieldDiffer};
use lex_merge::{Forest, Pipeline, PipelineConfig, PipelineFailure};
use lex_tree::{assemble, resolve_chain, IdentPathStrategy, NodeKey, ParentIdStrategy, RecordSet, Tree};
use lex_types::{ContentId, ContentNode, ContentRecord, DiffRecord, FieldValue, MergedContentNode, NodeBody, Span, SpanKind};

use crate::cli::*;

const NO_DIFFERENCES: &str = "No differences found.";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Tree(args) => cmd_tree(args, format),
        Command::Chain(args) => cmd_chain(args, format),
        Command::Diff(args) => cmd_diff(args, format),
        Command::Merge(args) => cmd_merge(args, format),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    PipelineConfig::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
}

fn cmd_tree(args: TreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let records: Vec<ContentRecord> = read_json(&args.records)?;
    if args.ident {
        print_tree(&assemble(&IdentPathStrategy, records)?, format)
    } else {
        print_tree(&assemble(&ParentIdStrategy, records)?, format)
    }
}

fn print_tree<K: NodeKey + Serialize>(tree: &Tree<K>, format: OutputFormat) -> anyhow::Result<()> {
    let roots = tree.to_nested();
    match format {
        OutputFormat::Json => {
            let out = json!({ "roots": roots, "orphans": tree.orphans() });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            print!("{}", format_content_nodes(&roots));
            for orphan in tree.orphans() {
                println!(
                    "{} {:?} names missing parent {:?}",
                    "warning:".yellow().bold(),
                    orphan.node,
                    orphan.missing_parent
                );
            }
        }
    }
    Ok(())
}

fn cmd_chain(args: ChainArgs, format: OutputFormat) -> anyhow::Result<()> {
    let records: Vec<ContentRecord> = read_json(&args.records)?;
    let set = RecordSet::new(records);
    let chain = resolve_chain(&set, ContentId::new(args.target), args.max_depth)?;

    match format {
        OutputFormat::Json => {
            let out = json!({ "chain": chain.nodes, "brokenAt": chain.broken_at });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if let Some(missing) = chain.broken_at {
                println!("{} parent {} is not in the record set", "broken:".yellow().bold(), missing);
            }
            for (depth, record) in chain.nodes.iter().enumerate() {
                let body = NodeBody::from_record(record, None);
                println!("{}{} {}", "  ".repeat(depth), record.id.to_string().dimmed(), node_label(&body));
            }
        }
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = DiffConfig {
        mode: args.mode.into(),
        merge_gap: args.merge_gap,
        ..Default::default()
    };
    let differ = FieldDiffer::new(config)?;
    let spans = differ.diff_text(&args.base, &args.candidate);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&spans)?),
        OutputFormat::Text if !has_changes(&spans) => println!("{NO_DIFFERENCES}"),
        OutputFormat::Text => println!("{}", format_spans(&spans)),
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.diff.mode = mode.into();
    }
    let records: Vec<ContentRecord> = read_json(&args.records)?;
    let diffs: Vec<DiffRecord> = read_json(&args.diffs)?;

    let pipeline = Pipeline::new(config)?;
    let snapshot = Arc::new(RecordSet::new(records));
    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let output = runtime.block_on(pipeline.run(snapshot, diffs))?;
    let forest = output.forest.forest();

    match format {
        OutputFormat::Json => {
            let failures: Vec<_> = output.failures.iter().map(failure_json).collect();
            let out = json!({ "roots": forest.roots, "orphans": forest.orphans, "failures": failures });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for failure in &output.failures {
                println!("{} {}", "failed:".red().bold(), describe_failure(failure));
            }
            if forest.is_empty() {
                println!("{NO_DIFFERENCES}");
            } else {
                print!("{}", format_forest(&forest));
            }
        }
    }
    Ok(())
}

fn failure_json(failure: &PipelineFailure) -> serde_json::Value {
    json!({
        "diffId": failure.diff_id,
        "target": failure.target,
        "error": failure.error.to_string(),
    })
}

fn describe_failure(failure: &PipelineFailure) -> String {
    format!("{} at {}: {}", failure.diff_id, failure.target, failure.error)
}

fn has_changes(spans: &[Span]) -> bool {
    spans
        .iter()
        .any(|s| matches!(s.kind, SpanKind::Removed | SpanKind::Added) && !s.text.is_empty())
}

fn format_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match &span.kind {
            SpanKind::Unchanged => span.text.normal().to_string(),
            SpanKind::Removed => span.text.red().strikethrough().to_string(),
            SpanKind::Added => span.text.green().underline().to_string(),
            SpanKind::Citation { .. } => span.text.blue().underline().to_string(),
        })
        .collect()
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Plain(text) => text.clone(),
        FieldValue::Linked(spans) | FieldValue::Diffed(spans) => format_spans(spans),
    }
}

fn node_label(body: &NodeBody) -> String {
    let mut label = format_value(&body.section_display);
    if let Some(heading) = &body.heading {
        if !label.is_empty() {
            label.push(' ');
        }
        label.push_str(&format_value(heading));
    }
    if label.trim().is_empty() {
        label = body
            .id
            .map(|id| id.to_string())
            .or_else(|| body.ident.clone())
            .unwrap_or_default();
    }
    if body.placeholder {
        format!("{} {}", label.dimmed(), "(placeholder)".dimmed())
    } else {
        label
    }
}

fn format_content_nodes(roots: &[ContentNode]) -> String {
    fn walk(node: &ContentNode, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node_label(&node.body));
        out.push('\n');
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }
    let mut out = String::new();
    for root in roots {
        walk(root, 0, &mut out);
    }
    out
}

fn format_forest(forest: &Forest) -> String {
    fn walk(node: &MergedContentNode, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let label = node_label(&node.body);
        out.push_str(&indent);
        if node.is_target {
            let ids: Vec<String> = node.diff_ids.iter().map(ToString::to_string).collect();
            out.push_str(&format!("{} {} [{}]", "◆".yellow(), label.bold(), ids.join(", ")));
        } else if node.is_on_path {
            out.push_str(&label.bold().to_string());
        } else {
            out.push_str(&label);
        }
        out.push('\n');
        if node.body.content_str.is_diffed() {
            out.push_str(&format!("{indent}  {}\n", format_value(&node.body.content_str)));
        }
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }
    let mut out = String::new();
    for root in &forest.roots {
        walk(root, 0, &mut out);
    }
    out
}
