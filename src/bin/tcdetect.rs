//! Command-line driver for the detection engine.
//!
//! ```text
//! tcdetect <namelist> --data <archive.nc> [--output detections.txt] [--state relax.state]
//! ```
//!
//! The namelist supplies the detection thresholds and time range; the
//! archive supplies the fields. Detections are written one line per
//! vortex as each step completes, and the relaxation mask is persisted at
//! the end so a follow-up invocation can continue the run.

use std::path::PathBuf;
use std::process::ExitCode;

use tcdetect::{ConfigError, DetectError, EngineError, GeometryError, NumericError};

struct Args {
    namelist: PathBuf,
    data: PathBuf,
    output: PathBuf,
    state: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut namelist = None;
    let mut data = None;
    let mut output = PathBuf::from("detections.txt");
    let mut state = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data" => {
                data = Some(PathBuf::from(
                    args.next().ok_or("--data needs a file argument")?,
                ))
            }
            "--output" => {
                output = PathBuf::from(args.next().ok_or("--output needs a file argument")?)
            }
            "--state" => {
                state = Some(PathBuf::from(
                    args.next().ok_or("--state needs a file argument")?,
                ))
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            _ if namelist.is_none() => namelist = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument '{arg}'\n{USAGE}")),
        }
    }

    Ok(Args {
        namelist: namelist.ok_or_else(|| format!("missing namelist path\n{USAGE}"))?,
        data: data.ok_or_else(|| format!("missing --data argument\n{USAGE}"))?,
        output,
        state,
    })
}

const USAGE: &str =
    "usage: tcdetect <namelist> --data <archive.nc> [--output <file>] [--state <file>]";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(1);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tcdetect: {err}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Map error families onto distinct exit codes.
fn exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::Config(ConfigError::Io(_)) => 4,
        EngineError::Config(_) => 2,
        EngineError::Geometry(GeometryError::MissingPressureLevel(_)) => 2,
        EngineError::Geometry(_) => 3,
        EngineError::Reader(_) | EngineError::Writer(_) | EngineError::State(_) => 4,
        EngineError::Numeric(NumericError::NonFiniteMean { .. }) => 5,
        EngineError::Detect(DetectError::Capacity { .. }) => 6,
    }
}

#[cfg(feature = "netcdf")]
fn run(args: &Args) -> Result<(), EngineError> {
    use std::fs::File;
    use std::io::BufWriter;

    use tcdetect::{load_relax_state, write_relax_state, DetectionWriter, Engine, NetCdfReader};

    let config = tcdetect::read_namelist_file(&args.namelist)?;
    let reader = NetCdfReader::open(&args.data)?;
    let mut engine = Engine::new(config, reader)?;

    if let Some(state_path) = &args.state {
        let (nlon, nlat) = (engine.grid().nlon(), engine.grid().nlat());
        let mask = load_relax_state(state_path, nlon, nlat)?;
        if mask.any() {
            tracing::info!(
                relaxed_cells = mask.count(),
                "continuing from persisted relaxation state"
            );
        }
        engine.set_relax_mask(mask);
    }

    let out = BufWriter::new(File::create(&args.output).map_err(tcdetect::WriterError::Io)?);
    let start = engine.config().start_date;
    let step_hours = engine.config().step_hours;
    let mut writer = DetectionWriter::new(out, start, step_hours);

    let grid = engine.grid().clone();
    let summary = engine.run_with(|record| writer.write_step(record.index, &grid, &record.detections))?;
    writer.into_inner()?;

    if let Some(state_path) = &args.state {
        write_relax_state(state_path, engine.relax_mask())?;
    }

    tracing::info!(
        steps = summary.steps,
        detections = summary.detections,
        wall_time_s = summary.wall_time,
        "run complete"
    );
    Ok(())
}

#[cfg(not(feature = "netcdf"))]
fn run(_args: &Args) -> Result<(), EngineError> {
    Err(EngineError::Reader(tcdetect::ReaderError::MissingVariable(
        "this build lacks the `netcdf` feature; rebuild with --features netcdf".to_string(),
    )))
}
