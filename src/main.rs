use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use crossfill::{find_fill, render_grid, CrosswordError, CrosswordResult, GridConfig, WordList};
use log::{debug, error, info, Level, LevelFilter};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The crossword structure: one line per row, with `_` for each fillable cell.
    structure: PathBuf,

    /// The word list, one word per line.
    words: PathBuf,

    /// Also write the filled grid to this file.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Enables log message output from the solver
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

fn configure_logging(verbose: bool) {
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "{} ", record.level())?;
            if record.level() != Level::Info {
                write!(
                    buf,
                    "[{}:{}] ",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0)
                )?;
            }
            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> CrosswordResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose);

    let config = GridConfig::from_structure_file(&args.structure)?;
    let word_list = WordList::from_file(&args.words)?;
    info!(
        "Loaded {} slots and {} words",
        config.slot_count(),
        word_list.len()
    );

    let result = match find_fill(&config, &word_list) {
        Ok(result) => result,
        Err(failure) => {
            debug!("Fill failed: {:?}", failure);
            println!("No solution.");
            return Ok(());
        }
    };

    info!("{:?}", result.statistics);

    let rendered = render_grid(&config, &word_list, &result.choices);
    println!("{rendered}");

    if let Some(path) = args.output {
        fs::write(&path, format!("{rendered}\n"))
            .map_err(|source| CrosswordError::Write { path, source })?;
    }

    Ok(())
}
