//! `summary` command: describe the score distribution of a score table.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use urbanity_data::{ScoreTable, read_score_table};
use urbanity_scorer::{HistogramBin, ScoreDistribution};

use crate::{ARG_SUMMARY_SCORES, ARG_SUMMARY_TOP, CliError, ENV_SUMMARY_SCORES, require_existing};

/// Municipalities listed per level unless configured otherwise.
pub(crate) const DEFAULT_TOP: usize = 10;

/// Width in characters of the longest histogram bar.
pub(crate) const BAR_WIDTH: usize = 50;

/// CLI arguments for the `summary` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read a score table written by `integrate` and print \
                 descriptive statistics, percentiles, a histogram of the \
                 composite scores, and the highest-scoring municipalities \
                 in each ten-point level.",
    about = "Summarise an urbanity score table"
)]
#[ortho_config(prefix = "URBANITY")]
pub(crate) struct SummaryArgs {
    /// Path to the score table (`urbanity-scores.json`).
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) scores_path: Option<Utf8PathBuf>,
    /// Municipalities listed per level.
    #[arg(long = ARG_SUMMARY_TOP, value_name = "count")]
    #[serde(default)]
    pub(crate) top: Option<usize>,
}

impl SummaryArgs {
    pub(crate) fn into_config(self) -> Result<SummaryConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SummaryConfig::try_from(merged)
    }
}

/// Resolved `summary` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummaryConfig {
    pub(crate) scores_path: Utf8PathBuf,
    pub(crate) top: usize,
}

impl TryFrom<SummaryArgs> for SummaryConfig {
    type Error = CliError;

    fn try_from(args: SummaryArgs) -> Result<Self, Self::Error> {
        let scores_path = args.scores_path.ok_or(CliError::MissingArgument {
            field: ARG_SUMMARY_SCORES,
            env: ENV_SUMMARY_SCORES,
        })?;
        Ok(Self {
            scores_path,
            top: args.top.unwrap_or(DEFAULT_TOP),
        })
    }
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    run_summary_with(args, &mut stdout)
}

pub(crate) fn run_summary_with(args: SummaryArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.scores_path, ARG_SUMMARY_SCORES)?;
    let table = read_score_table(&config.scores_path)?;
    let distribution =
        summarise(&table, config.top).ok_or_else(|| CliError::EmptyScoreTable {
            path: config.scores_path.clone(),
        })?;
    render_summary(writer, &config.scores_path, &distribution).map_err(CliError::WriteSummary)
}

/// Distribution of the non-null composites in `table`.
pub(crate) fn summarise(table: &ScoreTable, top: usize) -> Option<ScoreDistribution> {
    ScoreDistribution::from_pairs(
        table
            .iter()
            .filter_map(|(code, record)| record.urbanity.map(|score| (code.clone(), score))),
        top,
    )
}

pub(crate) fn render_summary(
    writer: &mut dyn Write,
    source: &Utf8Path,
    distribution: &ScoreDistribution,
) -> io::Result<()> {
    writeln!(writer, "Urbanity scores in {source}")?;
    writeln!(writer, "  municipalities {:>8}", distribution.count())?;
    writeln!(writer, "  mean           {:>8.2}", distribution.mean())?;
    writeln!(writer, "  median         {:>8.2}", distribution.median())?;
    writeln!(writer, "  min            {:>8.2}", distribution.min())?;
    writeln!(writer, "  max            {:>8.2}", distribution.max())?;
    writeln!(writer, "  std dev        {:>8.2}", distribution.std_dev())?;

    writeln!(writer)?;
    writeln!(writer, "Percentiles")?;
    for (percent, value) in distribution.percentiles() {
        writeln!(writer, "  p{percent:<3} {value:>8.2}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "Histogram")?;
    let tallest = distribution
        .histogram()
        .iter()
        .map(|bin| bin.count)
        .max()
        .unwrap_or(0);
    for bin in distribution.histogram() {
        render_bin(writer, bin, tallest)?;
    }

    writeln!(writer)?;
    writeln!(writer, "Levels")?;
    for level in distribution.levels().iter().rev() {
        writeln!(
            writer,
            "  level {:>2} [{:>3.0}, {:>3.0}] {} municipalities",
            level.level, level.lower, level.upper, level.count
        )?;
        for (code, score) in &level.top {
            writeln!(writer, "    {code}  {score:>6.2}")?;
        }
    }
    Ok(())
}

fn render_bin(writer: &mut dyn Write, bin: &HistogramBin, tallest: usize) -> io::Result<()> {
    let width = bin
        .count
        .saturating_mul(BAR_WIDTH)
        .checked_div(tallest)
        .unwrap_or(0);
    writeln!(
        writer,
        "  {:>3.0}-{:<3.0} {:>6} {}",
        bin.lower,
        bin.upper,
        bin.count,
        "#".repeat(width)
    )
}
