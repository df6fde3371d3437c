use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use pngscope::{InspectError, Options, Report};

#[derive(Parser)]
#[command(name = "pngscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dump the chunk structure of a PNG file as JSON", long_about = None)]
struct Cli {
    /// Input PNG file, `-` for stdin
    #[arg(default_value = "-")]
    infile: String,

    /// Output file, `-` for stdout
    #[arg(short, long = "output", default_value = "-")]
    outfile: String,

    /// Parse the IHDR chunk
    #[arg(long)]
    ihdr: bool,

    /// Decompress IDAT and check its length
    #[arg(long)]
    idat: bool,

    /// Leave the decompressed IDAT data out of the report
    #[arg(long)]
    no_idat_data: bool,

    /// Check chunk order, duplicates and trailing data
    #[arg(long)]
    check: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// More log output on stderr, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            decode_header: self.ihdr,
            assemble_image_data: self.idat,
            retain_raw_image_data: !self.no_idat_data,
            run_structural_checks: self.check,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[x] {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    // The fmt subscriber also picks up the library's `log` records.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let data = read_input(&cli.infile)?;
    log::info!("Read {} bytes from {}", data.len(), cli.infile);

    match pngscope::inspect(&data, &cli.options()) {
        Ok(report) => {
            write_report(cli, &report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(InspectError::Decoding(err)) => {
            eprintln!("[x] {err}");
            Ok(ExitCode::FAILURE)
        }
        Err(InspectError::Partial { report, error }) => {
            write_report(cli, &report)?;
            eprintln!("[x] {error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut data = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("Unable to read standard input")?;
        Ok(data)
    } else {
        std::fs::read(path).with_context(|| format!("Unable to open input file {path}"))
    }
}

fn write_report(cli: &Cli, report: &Report<'_>) -> Result<()> {
    let out: Box<dyn Write> = if cli.outfile == "-" {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(&cli.outfile)
            .with_context(|| format!("Unable to open output file {}", cli.outfile))?;
        Box::new(file)
    };
    let mut out = BufWriter::new(out);

    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, report)?;
    } else {
        serde_json::to_writer(&mut out, report)?;
    }
    writeln!(out)?;
    out.flush().context("Unable to write report")?;
    Ok(())
}
