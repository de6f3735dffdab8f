use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use igcpanel::{
    export,
    interpret::{interpret, SIGNIFICANCE_LEVEL},
    panel::{Metric, ModelSpec},
    AliasTable, DomainPolicy, InteractionPolicy, Panel, PanelBuilder, PipelineConfig,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "igcpanel", version, about = "University budget vs. IGC panel builder")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PipelineArgs {
    /// CSV or spreadsheet with Universidade, Ano, Orcamento and IGC columns
    file: PathBuf,
    /// YAML pipeline config (aliases, interaction, domain)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Extra YAML alias table merged over the built-in one
    #[arg(long)]
    aliases: Option<PathBuf>,
    /// Build `Interacao` from the previous year's budget
    #[arg(long)]
    lagged: bool,
    /// Abort instead of flagging rows whose logarithm is undefined
    #[arg(long)]
    reject_domain_errors: bool,
}

impl PipelineArgs {
    fn config(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(p) => PipelineConfig::load(p)
                .with_context(|| format!("loading config {}", p.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(p) = &self.aliases {
            let extra = AliasTable::load(p)
                .with_context(|| format!("loading aliases {}", p.display()))?;
            cfg.aliases = cfg.aliases.merged(&extra);
        }
        if self.lagged {
            cfg.interaction = InteractionPolicy::Lagged;
        }
        if self.reject_domain_errors {
            cfg.domain = DomainPolicy::Reject;
        }
        Ok(cfg)
    }

    fn build(&self) -> Result<Panel> {
        let builder = PanelBuilder::new(self.config()?);
        builder
            .build_path(&self.file)
            .with_context(|| format!("building panel from {}", self.file.display()))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the panel, report it and optionally export it
    Build {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Write the panel as Parquet
        #[arg(long)]
        parquet: Option<PathBuf>,
        /// Write the panel as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print this university's budget and IGC series
        #[arg(long)]
        highlight: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the regression input for one model (.csv or .parquet by extension)
    Frame {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// fe, re or did
        #[arg(long, default_value = "fe")]
        model: ModelSpec,
        #[arg(long)]
        out: PathBuf,
    },
    /// Pearson and Spearman correlation of budget and IGC
    Correlate {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Narrate a coefficient / p-value pair from the regression engine
    Interpret {
        #[arg(long)]
        coef: f64,
        #[arg(long = "p-value")]
        p_value: f64,
        #[arg(long, default_value_t = SIGNIFICANCE_LEVEL)]
        threshold: f64,
    },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) dispatch ─────────────────────────────────────────────────
    match Cli::parse().command {
        Command::Build {
            pipeline,
            parquet,
            csv,
            highlight,
            json,
        } => {
            let panel = pipeline.build()?;
            report(&panel, json)?;

            if let Some(name) = highlight.as_deref() {
                print_highlight(&panel, name);
            }
            if parquet.is_some() || csv.is_some() {
                let batch = panel.to_record_batch()?;
                if let Some(path) = parquet {
                    export::write_parquet(&batch, &path)
                        .with_context(|| format!("writing {}", path.display()))?;
                }
                if let Some(path) = csv {
                    export::write_csv(&batch, &path)
                        .with_context(|| format!("writing {}", path.display()))?;
                }
            }
        }
        Command::Frame {
            pipeline,
            model,
            out,
        } => {
            let panel = pipeline.build()?;
            let frame = panel.model_frame(model);
            info!(
                model = %model,
                rows = frame.rows.len(),
                entities = frame.entities(),
                excluded = frame.excluded_rows.len(),
                "model frame ready"
            );
            if !frame.excluded_rows.is_empty() {
                warn!(rows = ?frame.excluded_rows, "rows left out of the model frame");
            }
            write_by_extension(&frame.to_record_batch()?, &out)?;
            println!(
                "{} rows for `{}` (variable of interest: {}) → {}",
                frame.rows.len(),
                model,
                model.variable_of_interest(),
                out.display()
            );
        }
        Command::Correlate { pipeline } => {
            let panel = pipeline.build()?;
            let c = panel.budget_quality_correlation();
            let show = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("{:.4}", v));
            println!("pairs:    {}", c.pairs);
            println!("pearson:  {}", show(c.pearson));
            println!("spearman: {}", show(c.spearman));
            if let Some(strength) = c.strength {
                println!("reading:  {}", strength);
            }
        }
        Command::Interpret {
            coef,
            p_value,
            threshold,
        } => {
            println!("{}", interpret(coef, p_value, threshold));
        }
    }
    Ok(())
}

fn report(panel: &Panel, json: bool) -> Result<()> {
    let summary = panel.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("source:           {}", summary.source);
    println!("rows:             {}", summary.rows);
    println!("universities:     {}", summary.entities);
    if let (Some(first), Some(last)) = (summary.first_year, summary.last_year) {
        println!("years:            {}–{}", first, last);
    }
    println!("IGC interpolated: {}", summary.igc_interpolated);
    println!("IGC carried:      {}", summary.igc_carried);
    println!("IGC missing:      {}", summary.igc_missing);
    println!("domain issues:    {}", summary.domain_issues);
    for issue in panel.issues() {
        println!("  - {}", issue);
    }
    Ok(())
}

fn print_highlight(panel: &Panel, name: &str) {
    let budget = panel.chart_series(Metric::Budget, Some(name));
    let quality = panel.chart_series(Metric::Quality, Some(name));
    let pick = |series: &[igcpanel::panel::ChartSeries]| {
        series.iter().find(|s| s.highlighted).map(|s| s.points.clone())
    };
    match (pick(&budget), pick(&quality)) {
        (Some(b), Some(q)) => {
            println!("{} — Orcamento (milhões):", name);
            for p in b {
                println!("  {}  {:.2}", p.ano, p.value);
            }
            println!("{} — IGC:", name);
            for p in q {
                println!("  {}  {:.4}", p.ano, p.value);
            }
        }
        _ => warn!(university = name, "not present in the panel"),
    }
}

fn write_by_extension(batch: &arrow::record_batch::RecordBatch, out: &Path) -> Result<()> {
    let is_csv = out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        export::write_csv(batch, out)?;
    } else {
        export::write_parquet(batch, out)?;
    }
    Ok(())
}
