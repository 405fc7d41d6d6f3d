//! Developer tasks (schema generation, fixture conformance, explain coverage).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use polsat_app::{AuthorizeInput, run_authorize, serialize_report};
use polsat_settings::Overrides;
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("Cannot determine current directory")?,
    };

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .context("xtask has no parent")
    } else {
        Ok(manifest_dir)
    }
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

fn fixtures_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("tests").join("fixtures"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(polsat_types::ReportEnvelope)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(polsat_settings::PolsatConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "polsat.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "polsat.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Token pattern for error codes.
fn is_valid_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Run every fixture through the authorize use case and validate the produced
/// report against the generated report schema.
///
/// This checks:
/// 1. Schema validation of each report
/// 2. The decision recorded in the fixture's `expected.json`
/// 3. Token hygiene of `data.error_code`
fn conform() -> anyhow::Result<()> {
    let schema = serde_json::to_value(generate_report_schema()).context("schema to json")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("Failed to compile report schema: {e}"))?;
    println!("✓ polsat.report.v1 schema compiles");

    let dir = fixtures_dir()?;
    let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.join("request.toml").exists())
        .collect();
    entries.sort();

    let mut errors = Vec::new();
    for fixture in &entries {
        let name = fixture
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let document_text = fs::read_to_string(fixture.join("request.toml"))
            .with_context(|| format!("Failed to read {name}/request.toml"))?;

        let output = run_authorize(AuthorizeInput {
            document_text: &document_text,
            config_text: "",
            overrides: Overrides::default(),
        })
        .with_context(|| format!("{name}: authorize"))?;
        let bytes = serialize_report(&output.envelope)?;
        let report = polsat_test_util::normalized_report(&bytes)
            .with_context(|| format!("{name}: report json"))?;

        for err in validator.iter_errors(&report) {
            errors.push(format!("{name}: schema validation: {err}"));
        }

        let expected_path = fixture.join("expected.json");
        if expected_path.exists() {
            let expected: serde_json::Value = serde_json::from_str(
                &fs::read_to_string(&expected_path)
                    .with_context(|| format!("Failed to read {name}/expected.json"))?,
            )
            .with_context(|| format!("Failed to parse {name}/expected.json"))?;
            if report["decision"] != expected["decision"] {
                errors.push(format!(
                    "{name}: decision {} (expected {})",
                    report["decision"], expected["decision"]
                ));
            }
        }

        if let Some(code) = report["data"].get("error_code").and_then(|v| v.as_str())
            && !is_valid_token(code)
        {
            errors.push(format!("{name}: error_code '{code}' is not a valid token"));
        }

        println!("  ✓ {name}");
    }

    if entries.is_empty() {
        bail!("No fixtures found in {}", dir.display());
    }
    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} fixtures pass conformance checks!", entries.len());
    Ok(())
}

/// Validate that all rule kinds and codes have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    let rule_kinds = polsat_types::explain::all_rule_kinds();
    let codes = polsat_types::explain::all_codes();

    let mut errors = Vec::new();
    for (label, identifier) in rule_kinds
        .iter()
        .map(|k| ("Rule kind", *k))
        .chain(codes.iter().map(|c| ("Code", *c)))
    {
        match polsat_types::explain::lookup_explanation(identifier) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("{label} '{identifier}' has empty title"));
                }
                if exp.description.is_empty() {
                    errors.push(format!("{label} '{identifier}' has empty description"));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("{label} '{identifier}' has empty remediation"));
                }
            }
            None => errors.push(format!("{label} '{identifier}' has no explanation")),
        }
    }

    if errors.is_empty() {
        println!("✓ {} rule kinds have explanations", rule_kinds.len());
        println!("✓ {} codes have explanations", codes.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Run tests/fixtures through authorize and validate reports");
    eprintln!("  explain-coverage  Validate all rule kinds and codes have explanations");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
