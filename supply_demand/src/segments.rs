use crate::error::{SegmentConstraint, SegmentError};
use crate::{Distribution, Segment};
use rand::Rng;
use rand_distr::Normal;

/// Sample integer valuations from segments in order.
///
/// Each segment contributes `count` values appended after the previous
/// segment's block. Segments are validated before any of their values are
/// drawn. For a fixed RNG state the output is identical across calls.
pub fn sample_segments<R: Rng>(
    segments: &[Segment],
    rng: &mut R,
) -> Result<Vec<i64>, SegmentError> {
    let mut values = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        segment
            .validate()
            .map_err(|constraint| SegmentError { index, constraint })?;

        if segment.count == 0 {
            continue;
        }

        match segment.distribution {
            Distribution::Uniform => {
                for _ in 0..segment.count {
                    values.push(rng.random_range(segment.price_min..=segment.price_max));
                }
            }
            Distribution::Normal => {
                let std_dev = segment.effective_std_dev();
                let normal = Normal::new(segment.effective_mean(), std_dev).map_err(|_| {
                    SegmentError {
                        index,
                        constraint: SegmentConstraint::NonFiniteStdDev(std_dev),
                    }
                })?;
                for _ in 0..segment.count {
                    let draw: f64 = rng.sample(&normal);
                    values.push(clamp_round(draw, segment.price_min, segment.price_max));
                }
            }
        }
    }

    tracing::debug!(
        values = values.len(),
        segments = segments.len(),
        "sampled segments"
    );
    Ok(values)
}

/// Clamp into `[lo, hi]` then round half away from zero.
///
/// Integer bounds mean rounding a clamped value can never leave the interval.
fn clamp_round(x: f64, lo: i64, hi: i64) -> i64 {
    x.clamp(lo as f64, hi as f64).round() as i64
}
