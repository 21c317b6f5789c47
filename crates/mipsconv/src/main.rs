use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use std::fs;
use std::path::{Path, PathBuf};

use mips_asm::format::{fmt_listing, Report};
use mips_asm::isa::mips32;
use mips_asm::{assemble, AsmConfig, Assembly, IsaTable, OutputStyle};

#[derive(Parser, Debug)]
#[command(author, version, about = "Translate MIPS assembly into 32-bit machine words", long_about = None)]
struct Opts {
    /// Input assembly file
    #[arg(short, long, value_name = "FILE")]
    input_file: Option<PathBuf>,
    /// Output file (default: console)
    #[arg(short, long, value_name = "FILE")]
    output_file: Option<PathBuf>,
    /// Output in binary (default hex)
    #[arg(short = 'b', long)]
    binary: bool,
    /// Wrap words as 32-bit instruction memory initializers
    #[arg(short = 'v', long = "memory")]
    memory_init: bool,
    /// Include the source instructions as comments
    #[arg(short = 'x', long)]
    comments: bool,
    /// Instruction-set definition table (default: built-in MIPS32)
    #[arg(long, value_name = "FILE")]
    isa: Option<PathBuf>,
    /// Report numeric operands that do not fit their field
    #[arg(long)]
    strict_widths: bool,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn load_isa(path: Option<&Path>) -> Result<IsaTable> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p).with_context(|| format!("reading ISA table {}", p.display()))?;
            IsaTable::parse(&text).with_context(|| format!("loading ISA table {}", p.display()))
        }
        None => Ok(mips32::table()?),
    }
}

fn render(asm: &Assembly, style: &OutputStyle, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => fmt_listing(asm, style),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&Report::new(asm, style))?;
            json.push('\n');
            json
        }
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let Some(input) = opts.input_file.as_deref() else {
        eprintln!("No input file specified. Use `mipsconv --help` for help. Exiting.");
        return Ok(());
    };

    let isa = load_isa(opts.isa.as_deref())?;
    info!(
        instructions = isa.instruction_count(),
        registers = isa.register_count(),
        "ISA table ready"
    );
    let source = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let config = AsmConfig { strict_widths: opts.strict_widths, ..AsmConfig::default() };
    let asm = assemble(&isa, &source, config);
    info!(
        words = asm.instructions.len(),
        labels = asm.symbols.len(),
        diagnostics = asm.diagnostics.len(),
        "assembled {}",
        input.display()
    );
    if asm.symbols.is_empty() {
        debug!("no labels defined");
    }
    for (label, address) in asm.symbols.iter() {
        debug!(label, address, "symbol");
    }

    let style = OutputStyle {
        binary: opts.binary,
        comments: opts.comments,
        memory_init: opts.memory_init,
    };
    let out = render(&asm, &style, opts.format)?;
    match &opts.output_file {
        Some(path) => fs::write(path, out).with_context(|| format!("writing {}", path.display()))?,
        None => {
            if opts.format == OutputFormat::Text {
                println!("\n================================================");
                println!("Result:");
                println!("================================================");
            }
            print!("{out}");
        }
    }
    Ok(())
}
