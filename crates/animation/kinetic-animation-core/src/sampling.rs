//! Sampled curve evaluation.
//!
//! Model:
//! - A curve is a strictly increasing list of sample times with one value each.
//! - Evaluation at `t` finds the bracketing pair by binary search and linearly
//!   interpolates between them.
//! - Before the first sample the first value holds; after the last, the last.

/// One sampled component curve. Times are in clip-local seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    times: Vec<f32>,
    values: Vec<f32>,
}

impl Curve {
    /// Build from pre-validated samples (strictly increasing, finite, non-empty).
    pub(crate) fn from_samples(samples: &[[f32; 2]]) -> Self {
        Self {
            times: samples.iter().map(|s| s[0]).collect(),
            values: samples.iter().map(|s| s[1]).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last sample (0 for an empty curve).
    #[inline]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn sample(&self, t: f32) -> f32 {
        match find_segment(&self.times, t) {
            Segment::Empty => 0.0,
            Segment::Hold(i) => self.values[i],
            Segment::Between { left, local_t } => {
                let a = self.values[left];
                let b = self.values[left + 1];
                a + (b - a) * local_t
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Segment {
    Empty,
    /// Exactly on (or clamped to) a single sample.
    Hold(usize),
    /// Between `left` and `left + 1`, `local_t` in `[0, 1)`.
    Between { left: usize, local_t: f32 },
}

/// Locate `t` among `times` with a binary search.
pub(crate) fn find_segment(times: &[f32], t: f32) -> Segment {
    let n = times.len();
    if n == 0 {
        return Segment::Empty;
    }
    if n == 1 || t.is_nan() || t <= times[0] {
        return Segment::Hold(0);
    }
    if t >= times[n - 1] {
        return Segment::Hold(n - 1);
    }
    // First index whose time is > t; always in 1..n here.
    let right = times.partition_point(|&s| s <= t);
    let left = right - 1;
    let t0 = times[left];
    let t1 = times[right];
    let denom = t1 - t0;
    if denom <= 0.0 {
        return Segment::Hold(left);
    }
    Segment::Between {
        left,
        local_t: ((t - t0) / denom).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(samples: &[(f32, f32)]) -> Curve {
        let raw: Vec<[f32; 2]> = samples.iter().map(|(t, v)| [*t, *v]).collect();
        Curve::from_samples(&raw)
    }

    #[test]
    fn interpolates_between_brackets() {
        let c = curve(&[(0.0, 0.0), (1.0, 10.0), (2.0, 0.0)]);
        assert!((c.sample(0.5) - 5.0).abs() < 1e-6);
        assert!((c.sample(1.5) - 5.0).abs() < 1e-6);
        assert_eq!(c.sample(1.0), 10.0);
    }

    #[test]
    fn clamps_outside_range() {
        let c = curve(&[(0.5, 2.0), (1.0, 4.0)]);
        assert_eq!(c.sample(0.0), 2.0);
        assert_eq!(c.sample(3.0), 4.0);
        assert_eq!(c.sample(f32::NAN), 2.0);
    }

    #[test]
    fn single_sample_is_constant() {
        let c = curve(&[(0.0, 7.0)]);
        assert_eq!(c.sample(-1.0), 7.0);
        assert_eq!(c.sample(100.0), 7.0);
        assert_eq!(c.end_time(), 0.0);
    }

    #[test]
    fn segment_lookup_on_exact_sample() {
        let times = [0.0, 0.25, 0.5, 1.0];
        assert_eq!(
            find_segment(&times, 0.25),
            Segment::Between {
                left: 1,
                local_t: 0.0
            }
        );
        assert_eq!(find_segment(&times, 1.0), Segment::Hold(3));
        assert_eq!(find_segment(&[], 1.0), Segment::Empty);
    }
}
