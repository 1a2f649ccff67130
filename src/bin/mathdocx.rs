//! mathdocx CLI - export KaTeX-rendered HTML to Word with native equations

use clap::Parser;
use mathdocx::{DocxExporter, ExportOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mathdocx")]
#[command(version)]
#[command(about = "Convert rendered HTML with KaTeX math into a .docx file with native equations", long_about = None)]
struct Cli {
    /// Input HTML file (reads from stdin if not provided or "-")
    input: Option<PathBuf>,

    /// Output .docx path
    #[arg(short, long, required_unless_present = "dump_xml")]
    output: Option<PathBuf>,

    /// YAML file with export options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip a named OMML repair pass (repeatable)
    #[arg(long = "disable-rule", value_name = "NAME")]
    disable_rule: Vec<String>,

    /// Print word/document.xml after math splicing to stdout
    #[arg(long)]
    dump_xml: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(input: Option<&PathBuf>) -> io::Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path),
        _ => {
            let mut html = String::new();
            io::stdin().read_to_string(&mut html)?;
            Ok(html)
        },
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => ExportOptions::from_yaml_file(path)?,
        None => ExportOptions::default(),
    };
    for rule in cli.disable_rule {
        options = options.with_disabled_rule(rule);
    }

    let html = read_input(cli.input.as_ref())?;
    let output = DocxExporter::new(options).export_html(&html)?;

    if let Some(path) = &cli.output {
        std::fs::write(path, &output.package)?;
    }
    if cli.dump_xml {
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.document_xml.as_bytes())?;
        stdout.write_all(b"\n")?;
    }

    let report = output.report;
    eprintln!(
        "{} math element(s): {} converted, {} as LaTeX text, {} not spliced",
        report.math.elements,
        report.math.converted(),
        report.math.fallbacks,
        report.splice_skipped
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        },
    }
}
