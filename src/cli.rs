//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::cache_config::CacheConfig;
use crate::domain::engine::Engine;
use crate::domain::error::{Result, SimtraderError};
use crate::domain::identity::{Identifiable, Identity};
use crate::domain::indicator::IndicatorKind;
use crate::domain::ohlcv::Bars;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "simtrader", about = "Cached indicator engine over historical price bars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators for one symbol
    Indicators {
        /// Directory of <CODE>_<EXCHANGE>.csv files (or [data] path in the config)
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        code: String,
        #[arg(long)]
        exchange: String,
        /// Indicator spec such as SMA(20), BOLLINGER_UPPER(20,2) or OBV; repeatable
        #[arg(short, long = "indicator", required = true)]
        indicators: Vec<String>,
        /// Read the symbol on this symbol's time axis; repeat to use the
        /// union of several symbols' dates
        #[arg(long)]
        reference: Vec<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Number of trailing rows to print
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
    /// List available symbols on an exchange
    Symbols {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        exchange: String,
    },
    /// Show the data range of a symbol
    Info {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        exchange: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators {
            data,
            code,
            exchange,
            indicators,
            reference,
            config,
            start,
            end,
            last,
        } => run_indicators(
            data.as_deref(),
            config.as_deref(),
            &IndicatorRequest {
                code,
                exchange,
                references: reference,
                start,
                end,
                kinds: Vec::new(),
                last,
            },
            &indicators,
        ),
        Command::Symbols { data, exchange } => run_symbols(&data, &exchange),
        Command::Info {
            data,
            code,
            exchange,
        } => run_info(&data, &code, &exchange),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// Cache settings from the config file, or defaults without one.
pub fn resolve_cache_config(config: Option<&dyn ConfigPort>) -> Result<CacheConfig> {
    match config {
        Some(config) => CacheConfig::from_config(config),
        None => Ok(CacheConfig::default()),
    }
}

/// `--data` wins over `[data] path`.
pub fn resolve_data_dir(
    flag: Option<&Path>,
    config: Option<&dyn ConfigPort>,
) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    config
        .and_then(|c| c.get_string("data", "path"))
        .map(PathBuf::from)
        .ok_or_else(|| SimtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        })
}

pub fn parse_indicators(specs: &[String]) -> Result<Vec<IndicatorKind>> {
    specs.iter().map(|s| s.parse()).collect()
}

#[derive(Debug, Clone)]
pub struct IndicatorRequest {
    pub code: String,
    pub exchange: String,
    pub references: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub kinds: Vec<IndicatorKind>,
    pub last: usize,
}

#[derive(Debug, Clone)]
pub struct IndicatorColumn {
    pub kind: IndicatorKind,
    pub id: Identity,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<IndicatorColumn>,
    /// True when the symbol was read on a reference axis and at least one
    /// date was forward-filled.
    pub forward_filled: bool,
}

/// Load, optionally synchronize, compute every requested indicator and keep
/// the last `request.last` rows.
pub fn compute_indicators(
    engine: &Engine,
    data: &dyn DataPort,
    request: &IndicatorRequest,
) -> Result<IndicatorTable> {
    let (start, end) = resolve_range(data, request)?;
    let mut bars: Arc<Bars> = engine.load_bars(data, &request.code, &request.exchange, start, end)?;

    if !request.references.is_empty() {
        let references = request
            .references
            .iter()
            .map(|code| engine.load_bars(data, code, &request.exchange, start, end))
            .collect::<Result<Vec<_>>>()?;
        bars = Arc::new(engine.synchronize_to_union(&bars, &references)?);
        debug!(id = %bars.id(), "synchronized to reference axis");
    }

    let dates = bars.times();
    let skip = dates.len().saturating_sub(request.last);

    let columns = request
        .kinds
        .iter()
        .map(|&kind| {
            let series = engine.graph().bar_indicator(kind, &bars)?;
            Ok(IndicatorColumn {
                kind,
                id: series.id().clone(),
                values: series.to_vec()?.split_off(skip),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(IndicatorTable {
        dates: dates[skip..].to_vec(),
        columns,
        forward_filled: bars.synchronizer().is_some_and(|s| s.modified()),
    })
}

fn resolve_range(data: &dyn DataPort, request: &IndicatorRequest) -> Result<(NaiveDate, NaiveDate)> {
    if let (Some(start), Some(end)) = (request.start, request.end) {
        return Ok((start, end));
    }
    let (first, last, _) = data
        .get_data_range(&request.code, &request.exchange)?
        .ok_or_else(|| SimtraderError::NoData {
            code: request.code.clone(),
            exchange: request.exchange.clone(),
        })?;
    Ok((request.start.unwrap_or(first), request.end.unwrap_or(last)))
}

/// Tab-separated table: a header row of indicator names, then one row per
/// date.
pub fn format_table(table: &IndicatorTable) -> String {
    let mut out = String::from("date");
    for column in &table.columns {
        let _ = write!(out, "\t{}", column.kind);
    }
    out.push('\n');
    for (row, date) in table.dates.iter().enumerate() {
        let _ = write!(out, "{}", date);
        for column in &table.columns {
            let _ = write!(out, "\t{:.4}", column.values[row]);
        }
        out.push('\n');
    }
    out
}

fn run_indicators(
    data_flag: Option<&Path>,
    config_path: Option<&Path>,
    request: &IndicatorRequest,
    specs: &[String],
) -> Result<()> {
    let config = config_path.map(load_config).transpose()?;
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    let cache_config = resolve_cache_config(config_port)?;
    let data_dir = resolve_data_dir(data_flag, config_port)?;
    let request = IndicatorRequest {
        kinds: parse_indicators(specs)?,
        ..request.clone()
    };

    let engine = Engine::new(&cache_config)?;
    let adapter = CsvAdapter::new(data_dir);
    let table = compute_indicators(&engine, &adapter, &request)?;

    if table.forward_filled {
        eprintln!(
            "note: {}.{} has gaps on the reference axis; values are forward-filled",
            request.code, request.exchange
        );
    }
    print!("{}", format_table(&table));

    let stats = engine.stats();
    info!(
        series_hits = stats.series.hits,
        series_misses = stats.series.misses,
        data_misses = stats.data.misses,
        "done"
    );
    Ok(())
}

fn run_symbols(data: &Path, exchange: &str) -> Result<()> {
    let symbols = CsvAdapter::new(data.to_path_buf()).list_symbols(exchange)?;
    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_info(data: &Path, code: &str, exchange: &str) -> Result<()> {
    match CsvAdapter::new(data.to_path_buf()).get_data_range(code, exchange)? {
        Some((first, last, count)) => {
            println!("{}.{}: {} bars, {} to {}", code, exchange, count, first, last);
        }
        None => eprintln!("{}.{}: no data found", code, exchange),
    }
    Ok(())
}
