use anyhow::Context;
use colored::Colorize;
use ethr_ledger::{InMemoryRegistry, LedgerFixture};
use ethr_registry::{ErrorCode, Registry, ResolutionResult};
use ethr_resolver::{ChangeLog, EthrResolver, FixedClock, ResolverConfig};
use ethr_types::{Authentication, ChangeEvent, ChangeKind, Did, Document, KNOWN_NETWORKS};
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Resolve(args) => cmd_resolve(args, &cli.format),
        Command::Log(args) => cmd_log(args, &cli.format),
        Command::Networks => cmd_networks(&cli.format),
    }
}

fn build_resolver(args: &LedgerArgs, at: Option<u64>) -> anyhow::Result<EthrResolver<InMemoryRegistry>> {
    let registry = LedgerFixture::from_file(&args.ledger)?
        .into_registry()
        .with_context(|| format!("replaying {}", args.ledger.display()))?;
    // Without a config file the resolver reads the fixture's own registry.
    let config = match &args.config {
        Some(path) => ResolverConfig::from_file(path)?,
        None => ResolverConfig::default().with_registry(registry.address()),
    };
    let resolver = EthrResolver::new(registry, config);
    Ok(match at {
        Some(now) => resolver.with_clock(FixedClock(now)),
        None => resolver,
    })
}

fn resolve_all(args: &ResolveArgs) -> anyhow::Result<Vec<ResolutionResult>> {
    let mut registry = if args.cache {
        Registry::new().with_cache()
    } else {
        Registry::new()
    };
    registry.register(build_resolver(&args.ledger, args.at)?)?;
    Ok(args.dids.iter().map(|did| registry.resolve(did)).collect())
}

fn cmd_resolve(args: ResolveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let results = resolve_all(&args)?;
    match format {
        OutputFormat::Json if results.len() == 1 => {
            println!("{}", serde_json::to_string_pretty(&results[0])?)
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            for (did, result) in args.dids.iter().zip(&results) {
                println!("{}", render_result(did, result));
            }
        }
    }

    let failed = results
        .iter()
        .filter(|r| !r.is_success() && r.resolution_metadata.error != Some(ErrorCode::Deactivated))
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} DIDs failed to resolve", results.len());
    }
    Ok(())
}

fn cmd_log(args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let resolver = build_resolver(&args.ledger, None)?;
    let did = Did::parse(&args.did)?;
    let log = resolver.change_log(&did)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&log_json(&log))?),
        OutputFormat::Text => println!("{}", render_log(&log)),
    }
    Ok(())
}

fn cmd_networks(format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let networks: Vec<_> = KNOWN_NETWORKS
                .iter()
                .map(|(name, chain_id)| json!({ "name": name, "chain_id": chain_id }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&networks)?);
        }
        OutputFormat::Text => {
            for (name, chain_id) in KNOWN_NETWORKS {
                println!("{:<10} {}", name.bold(), chain_id);
            }
            println!("{}", "Other networks: hex chain id, e.g. did:ethr:0x89:<address>".dimmed());
        }
    }
    Ok(())
}

fn render_result(did: &str, result: &ResolutionResult) -> String {
    match (&result.resolution_metadata.error, &result.document) {
        (None, Some(doc)) => format!("{} {}\n{}", "✓".green().bold(), did.bold(), render_document(doc)),
        (Some(ErrorCode::Deactivated), _) => {
            format!("{} {} {}", "⊘".yellow().bold(), did.bold(), "deactivated".yellow())
        }
        (code, _) => format!(
            "{} {} {}: {}",
            "✗".red().bold(),
            did.bold(),
            code.map_or("error", ErrorCode::as_str).red(),
            result.resolution_metadata.message.as_deref().unwrap_or_default()
        ),
    }
}

fn render_document(doc: &Document) -> String {
    let fragment = |id: &str| id.strip_prefix(doc.id.as_str()).unwrap_or(id).to_string();
    let mut lines = Vec::new();

    lines.push("  verificationMethod:".to_string());
    for method in &doc.verification_method {
        let material = method
            .blockchain_account_id
            .clone()
            .or_else(|| method.public_key_multibase.clone())
            .or_else(|| method.public_key_pem.as_ref().map(|_| "(pem)".to_string()))
            .unwrap_or_default();
        lines.push(format!(
            "    {:<16} {} {}",
            fragment(&method.id).cyan(),
            method.kind,
            material.dimmed()
        ));
    }

    lines.push("  authentication:".to_string());
    for auth in &doc.authentication {
        let id = match auth {
            Authentication::Reference(id) => id.as_str(),
            Authentication::Embedded(method) => method.id.as_str(),
        };
        lines.push(format!("    {}", fragment(id).cyan()));
    }

    if !doc.service.is_empty() {
        lines.push("  service:".to_string());
        for service in &doc.service {
            lines.push(format!(
                "    {:<16} {} {}",
                fragment(&service.id).cyan(),
                service.kind,
                service.service_endpoint.blue()
            ));
        }
    }
    lines.join("\n")
}

fn render_log(log: &ChangeLog) -> String {
    let mut lines = vec![format!("controller: {}", log.controller.to_string().yellow())];
    if log.embedded_key.is_some() {
        lines.push(format!("embedded key: {}", "valid".green()));
    }
    if log.events.is_empty() {
        lines.push("No changes recorded.".to_string());
        return lines.join("\n");
    }
    let blocks: Vec<_> = log.batches.iter().map(ToString::to_string).collect();
    lines.push(format!("blocks: {}", blocks.join(" ")));
    for event in &log.events {
        lines.push(render_event(event));
    }
    lines.join("\n")
}

fn render_event(event: &ChangeEvent) -> String {
    let position = format!("{}.{}", event.block, event.log_index).yellow();
    let summary = match &event.kind {
        ChangeKind::OwnerChanged { owner } if owner.is_zero() => {
            format!("{} {}", "owner".bold(), "deactivated".red())
        }
        ChangeKind::OwnerChanged { owner } => format!("{} → {}", "owner".bold(), owner),
        ChangeKind::DelegateChanged {
            delegate_type,
            delegate,
            valid_to,
        } => format!(
            "{} {} {} {}",
            "delegate".bold(),
            delegate_type.normalized(),
            delegate,
            validity(*valid_to)
        ),
        ChangeKind::AttributeChanged {
            name,
            value,
            valid_to,
        } => format!(
            "{} {} = {} {}",
            "attribute".bold(),
            name.normalized(),
            value.as_text(),
            validity(*valid_to)
        ),
    };
    format!("{position}  {summary}  (prev {})", event.previous_change)
}

fn validity(valid_to: u64) -> String {
    if valid_to == 0 {
        return "revoked".red().to_string();
    }
    let until = i64::try_from(valid_to)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
    match until {
        Some(t) => format!("until {}", t.to_rfc3339()),
        None => format!("until {valid_to}"),
    }
}

fn log_json(log: &ChangeLog) -> serde_json::Value {
    json!({
        "controller": log.controller,
        "embedded_key": log.embedded_key.as_ref().map(|k| format!("0x{}", hex::encode(k.as_bytes()))),
        "batches": log.batches,
        "events": log.events,
    })
}
