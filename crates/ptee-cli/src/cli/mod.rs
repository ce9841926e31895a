//! CLI entry and option assembly.

use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::tty::IsTty;
use ptee_core::config::{Config, config_error};
use ptee_core::interrupt;
use ptee_core::pipeline::{self, InputTx, Pipeline};
use ptee_core::render::{Renderer, Sink, SinkKind, StripPolicy};

const AFTER_HELP: &str = "\
- The rendered stream goes to standard output; each OUTFILE receives the
  plain form of the same stream.
- Lines are classified in priority order: SKIP, HEADING, CONTEXT (at a
  level), REGULAR.
- CONTEXT lines overwrite one another on a single status line; a context
  at some level also clears all deeper levels.
- REGULAR lines print permanently, preceded by the context they arrived
  under. HEADING lines print permanently without promoting the context.
- With --strip (the default when stdout is not a terminal), status churn
  that would have been overwritten is removed entirely.
- ptee waits up to --partial-line-timeout seconds for the rest of a
  partial line; on timeout the partial is shown immediately and the whole
  line is treated as REGULAR.";

#[derive(Parser)]
#[command(name = "ptee")]
#[command(version)]
#[command(about = "Enhanced \"tee\": live status line for noisy build output")]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Write a plain copy of the rendered stream to each OUTFILE
    #[arg(value_name = "OUTFILE")]
    files: Vec<PathBuf>,

    /// Append a level-0 context regular expression
    #[arg(long, value_name = "REGEX")]
    regex: Vec<String>,

    /// Append a context regular expression at LEVEL (0 is the broadest)
    #[arg(
        long,
        num_args = 2,
        value_names = ["LEVEL", "REGEX"],
        action = clap::ArgAction::Append
    )]
    level_regex: Vec<String>,

    /// Append a heading regular expression
    #[arg(long, value_name = "HEADING_REGEX")]
    heading_regex: Vec<String>,

    /// Append a COUNT and a skip regular expression; a match discards the
    /// matching line and the next COUNT-1 lines
    #[arg(
        long,
        num_args = 2,
        value_names = ["COUNT", "SKIP_REGEX"],
        action = clap::ArgAction::Append
    )]
    skip_regex: Vec<String>,

    /// Remove overwritten status from all outputs instead of displaying it
    /// in place; the default when stdout is not a terminal
    #[arg(long, overrides_with = "no_strip")]
    strip: bool,

    /// Keep overwritten status in all outputs
    #[arg(long, overrides_with = "strip")]
    no_strip: bool,

    /// Seconds to wait for the rest of a partial line (0 disables)
    #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
    partial_line_timeout: f64,

    /// Encoding for standard input and all outputs
    #[arg(long, value_name = "NAME", default_value = "utf-8")]
    encoding: String,

    /// Width for truncating status lines (0 detects the terminal width)
    #[arg(long, value_name = "COLUMNS", default_value_t = 0)]
    width: usize,

    /// Append to OUTFILEs instead of overwriting them
    #[arg(short, long)]
    append: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    let config = build_config(&cli)?;
    let renderer = build_renderer(&cli, &config)?;
    let pipeline = Pipeline::new(config, renderer);

    let (tx, rx) = pipeline::input_channel();
    spawn_stdin_reader(tx);

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(pipeline.run(rx))
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::default();

    for pair in cli.skip_regex.chunks_exact(2) {
        let count: u32 = pair[0]
            .parse()
            .map_err(|_| config_error(format!("argument --skip-regex: invalid COUNT '{}'", pair[0])))?;
        config.rules.push_skip_rule(count, &pair[1])?;
    }
    for pattern in &cli.heading_regex {
        config.rules.push_heading_rule(pattern)?;
    }
    for pair in cli.level_regex.chunks_exact(2) {
        let level: usize = pair[0]
            .parse()
            .map_err(|_| config_error(format!("argument --level-regex: invalid LEVEL '{}'", pair[0])))?;
        config.rules.push_level_rule(level, &pair[1])?;
    }
    for pattern in &cli.regex {
        config.rules.push_level_rule(0, pattern)?;
    }

    config.strip = if cli.strip {
        StripPolicy::AlwaysStrip
    } else if cli.no_strip {
        StripPolicy::NeverStrip
    } else {
        StripPolicy::Auto
    };
    config.set_partial_line_timeout(cli.partial_line_timeout)?;
    config.set_encoding(&cli.encoding)?;
    config.width = cli.width;

    Ok(config)
}

fn build_renderer(cli: &Cli, config: &Config) -> Result<Renderer> {
    let stdout = std::io::stdout();
    let kind = if stdout.is_tty() {
        SinkKind::Terminal
    } else {
        SinkKind::Stream
    };
    let primary = Sink::new(
        "stdout",
        Box::new(stdout),
        kind,
        config.strip,
        config.encoding,
    );

    let mut aux = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = if cli.append {
            OpenOptions::new().create(true).append(true).open(path)
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
        }
        .with_context(|| format!("open {}", path.display()))?;
        aux.push(Sink::new(
            path.display().to_string(),
            Box::new(BufWriter::new(file)),
            SinkKind::Stream,
            config.strip,
            config.encoding,
        ));
    }

    Ok(Renderer::new(primary, aux, config.width))
}

/// Posts stdin chunks to the pipeline from a dedicated thread.
///
/// A read error is treated as end of input: the sender is dropped and the
/// pipeline drains what it has.
fn spawn_stdin_reader(tx: InputTx) {
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut buf = [0u8; 8192];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
    });
}
