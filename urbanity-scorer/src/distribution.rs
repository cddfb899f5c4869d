//! Descriptive statistics over a finished score table.

use std::cmp::Ordering;

use urbanity_core::{CompositeScores, MunicipalityCode, SCORE_MAX, SCORE_MIN};

/// Percentiles reported by [`ScoreDistribution`].
pub const REPORTED_PERCENTILES: [u8; 7] = [10, 25, 50, 75, 90, 95, 99];

/// Width of one histogram bin in score points.
pub const HISTOGRAM_BIN_WIDTH: f64 = 5.0;

/// Width of one level band in score points.
pub const LEVEL_WIDTH: f64 = 10.0;

const HISTOGRAM_BINS: usize = 20;
const LEVELS: usize = 10;

/// One 5-point histogram bin.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Upper edge; exclusive except for the last bin.
    pub upper: f64,
    /// Number of scores in the bin.
    pub count: usize,
}

/// A 10-point band of scores and its highest-ranked members.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreLevel {
    /// Level number, 1 for `0..10` through 10 for `90..=100`.
    pub level: u8,
    /// Inclusive lower edge.
    pub lower: f64,
    /// Upper edge; exclusive except for level 10.
    pub upper: f64,
    /// Number of scores in the band.
    pub count: usize,
    /// Highest scores in the band, descending, ties broken by code.
    pub top: Vec<(MunicipalityCode, f64)>,
}

/// Summary of composite scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDistribution {
    count: usize,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
    std_dev: f64,
    percentiles: Vec<(u8, f64)>,
    histogram: Vec<HistogramBin>,
    levels: Vec<ScoreLevel>,
}

impl ScoreDistribution {
    /// Summarise `(code, score)` pairs, keeping up to `top` entries per level.
    ///
    /// Returns `None` when there are no finite scores.
    ///
    /// # Examples
    /// ```
    /// use urbanity_core::MunicipalityCode;
    /// use urbanity_scorer::ScoreDistribution;
    ///
    /// let scores = [("01101", 10.0), ("01102", 30.0), ("01103", 100.0)]
    ///     .map(|(code, score)| (MunicipalityCode::parse(code).expect("code"), score));
    /// let summary = ScoreDistribution::from_pairs(scores, 5).expect("summary");
    /// assert_eq!(summary.median(), 30.0);
    /// assert_eq!(summary.levels().last().map(|level| level.count), Some(1));
    /// ```
    #[must_use]
    pub fn from_pairs<I>(pairs: I, top: usize) -> Option<Self>
    where
        I: IntoIterator<Item = (MunicipalityCode, f64)>,
    {
        let mut entries: Vec<(MunicipalityCode, f64)> = pairs
            .into_iter()
            .filter(|(_, score)| score.is_finite())
            .collect();
        if entries.is_empty() {
            return None;
        }
        entries.sort_by(|left, right| {
            right
                .1
                .partial_cmp(&left.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.0.cmp(&right.0))
        });
        let mut sorted: Vec<f64> = entries.iter().map(|(_, score)| *score).collect();
        sorted.reverse();

        let (mean, std_dev) = mean_and_std_dev(&sorted);
        let percentiles = REPORTED_PERCENTILES
            .iter()
            .map(|percent| (*percent, percentile(&sorted, f64::from(*percent))))
            .collect();
        Some(Self {
            count: sorted.len(),
            mean,
            median: percentile(&sorted, 50.0),
            min: sorted.first().copied().unwrap_or(SCORE_MIN),
            max: sorted.last().copied().unwrap_or(SCORE_MAX),
            std_dev,
            percentiles,
            histogram: histogram(&sorted),
            levels: levels(&entries, top),
        })
    }

    /// Summarise the composites of a finished run; missing scores are skipped.
    #[must_use]
    pub fn from_scores(scores: &CompositeScores, top: usize) -> Option<Self> {
        Self::from_pairs(
            scores
                .iter()
                .filter_map(|(code, score)| score.composite().map(|value| (code.clone(), value))),
            top,
        )
    }

    /// Number of scores summarised.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean.
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Median (50th percentile).
    #[must_use]
    pub const fn median(&self) -> f64 {
        self.median
    }

    /// Smallest score.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Largest score.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Population standard deviation.
    #[must_use]
    pub const fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// `(percent, value)` pairs for [`REPORTED_PERCENTILES`].
    #[must_use]
    pub fn percentiles(&self) -> &[(u8, f64)] {
        &self.percentiles
    }

    /// Twenty 5-point bins covering `0..=100`.
    #[must_use]
    pub fn histogram(&self) -> &[HistogramBin] {
        &self.histogram
    }

    /// Ten 10-point levels covering `0..=100`.
    #[must_use]
    pub fn levels(&self) -> &[ScoreLevel] {
        &self.levels
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "mean and variance are floating-point averages"
)]
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / count;
    (mean, variance.sqrt())
}

/// Linear interpolation between closest ranks over ascending `sorted`.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "rank positions are derived from a floating-point percentile"
)]
fn percentile(sorted: &[f64], percent: f64) -> f64 {
    let last = sorted.len().saturating_sub(1);
    let rank = percent / 100.0 * last as f64;
    let lower = (rank.floor() as usize).min(last);
    let upper = (rank.ceil() as usize).min(last);
    let low = sorted.get(lower).copied().unwrap_or(SCORE_MIN);
    let high = sorted.get(upper).copied().unwrap_or(low);
    (high - low).mul_add(rank - lower as f64, low)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "band index is the floor of score / width"
)]
fn band_index(score: f64, width: f64, bands: usize) -> usize {
    let index = (score.clamp(SCORE_MIN, SCORE_MAX) / width).floor() as usize;
    index.min(bands.saturating_sub(1))
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "bin edges are multiples of the bin width"
)]
fn edges(index: usize, width: f64) -> (f64, f64) {
    let lower = index as f64 * width;
    (lower, lower + width)
}

fn histogram(sorted: &[f64]) -> Vec<HistogramBin> {
    let mut counts = vec![0_usize; HISTOGRAM_BINS];
    for score in sorted {
        if let Some(count) = counts.get_mut(band_index(*score, HISTOGRAM_BIN_WIDTH, HISTOGRAM_BINS)) {
            *count += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| {
            let (lower, upper) = edges(index, HISTOGRAM_BIN_WIDTH);
            HistogramBin {
                lower,
                upper,
                count,
            }
        })
        .collect()
}

/// Group `ranked` (already sorted by score descending) into levels.
fn levels(ranked: &[(MunicipalityCode, f64)], top: usize) -> Vec<ScoreLevel> {
    let mut bands: Vec<ScoreLevel> = (0..LEVELS)
        .map(|index| {
            let (lower, upper) = edges(index, LEVEL_WIDTH);
            ScoreLevel {
                level: u8::try_from(index + 1).unwrap_or(u8::MAX),
                lower,
                upper,
                count: 0,
                top: Vec::new(),
            }
        })
        .collect();
    for (code, score) in ranked {
        let Some(band) = bands.get_mut(band_index(*score, LEVEL_WIDTH, LEVELS)) else {
            continue;
        };
        band.count += 1;
        if band.top.len() < top {
            band.top.push((code.clone(), *score));
        }
    }
    bands
}
