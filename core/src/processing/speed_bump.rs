use crate::interface::{DetectionResult, PatternType};
use crate::math::{KalmanSmoother, StatsHelper};
use crate::prelude::AnomalyClassifier;
use crate::telemetry::log::LogManager;

const ELEVATION_STD_FACTOR: f32 = 1.5;
const ELEVATION_RANGE_FACTOR: f32 = 0.12;

const CLASSIC_RISE_FRACTION: f32 = 0.3;
const CLASSIC_SUSTAIN_FRACTION: f32 = 0.7;
const CLASSIC_DESCENT_FRACTION: f32 = 0.5;
const CLASSIC_SETTLE_FRACTION: f32 = 0.3;
const CLASSIC_RISE_TIMEOUT: usize = 6;
const CLASSIC_DESCENT_TIMEOUT: usize = 10;
const CLASSIC_SUSTAIN_CAP: f32 = 3.0;
const CLASSIC_DURATION: (usize, usize) = (8, 20);
const CLASSIC_SCALE: f32 = 0.95;

const EXTENDED_THRESHOLD_SCALE: f32 = 0.7;
const EXTENDED_EDGE_FRACTION: f32 = 0.5;
const EXTENDED_SUSTAIN_FRACTION: f32 = 0.7;
const EXTENDED_SETTLE_FRACTION: f32 = 0.3;
const EXTENDED_MIN_SUSTAIN: usize = 5;
const EXTENDED_SPAN: (usize, usize) = (10, 30);
const EXTENDED_SUSTAIN_BAND: (usize, usize) = (5, 15);
const EXTENDED_SCALE: f32 = 0.9;

const DOUBLE_THRESHOLD_SCALE: f32 = 0.8;
const DOUBLE_ENTER_FRACTION: f32 = 0.6;
const DOUBLE_EXIT_FRACTION: f32 = 0.3;
const DOUBLE_MIN_RUN: usize = 3;
const DOUBLE_MAX_RUN: usize = 15;
const DOUBLE_MAX_GAP: usize = 30;
const DOUBLE_SEPARATION: (usize, usize) = (10, 25);
const DOUBLE_SCALE: f32 = 0.92;

const SYMMETRY_FALLBACK: f32 = 0.5;
const RATE_FLOOR: f32 = 0.0001;

/// Runs the classic, extended and double elevation matchers and keeps the
/// most confident one.
#[derive(Debug, Clone)]
pub struct SpeedBumpClassifier {
    min_samples: usize,
    smoother: KalmanSmoother,
    logger: LogManager,
}

impl SpeedBumpClassifier {
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples,
            smoother: KalmanSmoother::default(),
            logger: LogManager::new(),
        }
    }
}

impl Default for SpeedBumpClassifier {
    fn default() -> Self {
        Self::new(10)
    }
}

impl AnomalyClassifier for SpeedBumpClassifier {
    fn classify(&self, window: &[f32], baseline: f32) -> DetectionResult {
        if window.len() < self.min_samples {
            return DetectionResult::undetected(window);
        }

        let smoothed = self.smoother.smooth(window);
        let stats = StatsHelper::compute(&smoothed);
        let elevation = (stats.std_dev * ELEVATION_STD_FACTOR)
            .max(stats.range * ELEVATION_RANGE_FACTOR);

        let candidates = vec![
            classic_bump(&smoothed, baseline, elevation, window),
            extended_bump(
                &smoothed,
                baseline,
                elevation * EXTENDED_THRESHOLD_SCALE,
                window,
            ),
            double_bump(&smoothed, baseline, elevation * DOUBLE_THRESHOLD_SCALE, window),
        ];
        for candidate in &candidates {
            self.logger.pattern("speed bump", candidate);
        }

        DetectionResult::best_of(candidates).unwrap_or_else(|| DetectionResult::undetected(window))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BumpState {
    Normal,
    Rising,
    Elevated,
    Descending,
}

/// Gradual rise, short sustained elevation, gradual descent.
pub(crate) fn classic_bump(
    data: &[f32],
    baseline: f32,
    threshold: f32,
    window: &[f32],
) -> DetectionResult {
    let mut state = BumpState::Normal;
    let mut rise_start = 0usize;
    let mut elevation_start = 0usize;
    let mut elevation_end = 0usize;
    let mut max_elevation = 0.0f32;
    let mut sustained = 0usize;

    for i in 1..data.len() {
        let (previous, value) = (data[i - 1], data[i]);

        match state {
            BumpState::Normal => {
                if value > previous && value > baseline + threshold * CLASSIC_RISE_FRACTION {
                    state = BumpState::Rising;
                    rise_start = i;
                }
            }
            BumpState::Rising => {
                if value > baseline + threshold {
                    state = BumpState::Elevated;
                    elevation_start = i;
                    max_elevation = value - baseline;
                } else if value < previous && i - rise_start > CLASSIC_RISE_TIMEOUT {
                    state = BumpState::Normal;
                }
            }
            BumpState::Elevated => {
                if value > baseline + threshold * CLASSIC_SUSTAIN_FRACTION {
                    sustained += 1;
                    max_elevation = max_elevation.max(value - baseline);
                } else if value < baseline + threshold * CLASSIC_DESCENT_FRACTION {
                    state = BumpState::Descending;
                    elevation_end = i;
                }
            }
            BumpState::Descending => {
                if (value - baseline).abs() < threshold * CLASSIC_SETTLE_FRACTION {
                    let duration = i - rise_start;
                    let elevation_quality = max_elevation / threshold;
                    let sustained_quality = (sustained as f32 / CLASSIC_SUSTAIN_CAP).min(1.0);
                    let duration_quality =
                        if (CLASSIC_DURATION.0..=CLASSIC_DURATION.1).contains(&duration) {
                            1.0
                        } else {
                            0.7
                        };
                    let symmetry =
                        symmetry_factor(data, rise_start, elevation_start, elevation_end, i);

                    let confidence = (elevation_quality * 0.3
                        + sustained_quality * 0.2
                        + duration_quality * 0.2
                        + symmetry * 0.3)
                        * CLASSIC_SCALE;
                    return DetectionResult::detected(
                        PatternType::ClassicBump,
                        confidence,
                        rise_start,
                        window,
                    );
                } else if i - elevation_end > CLASSIC_DESCENT_TIMEOUT {
                    state = BumpState::Normal;
                }
            }
        }
    }

    DetectionResult::undetected(window)
}

/// Phase flags of the extended matcher, reset together when a candidate
/// fails to qualify.
#[derive(Debug, Default)]
struct ExtendedPhases {
    start: Option<usize>,
    elevated: usize,
    max_elevation: f32,
    rising: bool,
    descending: bool,
}

/// Long elevated plateau such as a speed table.
pub(crate) fn extended_bump(
    data: &[f32],
    baseline: f32,
    threshold: f32,
    window: &[f32],
) -> DetectionResult {
    let mut phases = ExtendedPhases::default();

    for i in 1..data.len().saturating_sub(1) {
        let (previous, value, next) = (data[i - 1], data[i], data[i + 1]);
        let elevation = value - baseline;

        if !phases.rising
            && phases.start.is_none()
            && value > previous
            && elevation > threshold * EXTENDED_EDGE_FRACTION
        {
            phases.start = Some(i);
            phases.rising = true;
        }

        if phases.start.is_some() && elevation > threshold * EXTENDED_SUSTAIN_FRACTION {
            phases.elevated += 1;
            phases.max_elevation = phases.max_elevation.max(elevation);
        }

        if phases.rising
            && !phases.descending
            && phases.elevated >= EXTENDED_MIN_SUSTAIN
            && value < next
            && elevation > threshold * EXTENDED_EDGE_FRACTION
        {
            phases.descending = true;
        }

        if phases.descending && (value - baseline).abs() < threshold * EXTENDED_SETTLE_FRACTION {
            if let Some(start) = phases.start {
                let span = i - start;
                if phases.elevated >= EXTENDED_MIN_SUSTAIN
                    && (EXTENDED_SPAN.0..=EXTENDED_SPAN.1).contains(&span)
                {
                    let elevation_quality = phases.max_elevation / threshold;
                    let duration_quality = if (EXTENDED_SUSTAIN_BAND.0..=EXTENDED_SUSTAIN_BAND.1)
                        .contains(&phases.elevated)
                    {
                        1.0
                    } else {
                        0.8
                    };
                    let confidence =
                        (elevation_quality * 0.6 + duration_quality * 0.4) * EXTENDED_SCALE;
                    return DetectionResult::detected(
                        PatternType::ExtendedBump,
                        confidence,
                        start,
                        window,
                    );
                }
            }
            phases = ExtendedPhases::default();
        }
    }

    DetectionResult::undetected(window)
}

/// Two short bumps in quick succession.
pub(crate) fn double_bump(
    data: &[f32],
    baseline: f32,
    threshold: f32,
    window: &[f32],
) -> DetectionResult {
    let mut bump_count = 0usize;
    let mut first_bump = 0usize;
    let mut last_bump_end = 0usize;
    let mut current_start = 0usize;
    let mut in_bump = false;
    let mut max_elevation = 0.0f32;
    let mut total_elevation = 0.0f32;

    for i in 1..data.len().saturating_sub(1) {
        let (previous, value) = (data[i - 1], data[i]);
        let elevation = value - baseline;

        if !in_bump && elevation > threshold * DOUBLE_ENTER_FRACTION && value > previous {
            in_bump = true;
            current_start = i;
        }

        if in_bump {
            max_elevation = max_elevation.max(elevation);
        }

        if in_bump
            && elevation < threshold * DOUBLE_EXIT_FRACTION
            && i - current_start >= DOUBLE_MIN_RUN
        {
            in_bump = false;
            bump_count += 1;
            total_elevation += max_elevation;
            if bump_count == 1 {
                first_bump = current_start;
            }
            last_bump_end = i;
            max_elevation = 0.0;

            let separation = last_bump_end - first_bump;
            if bump_count == 2 && separation <= DOUBLE_MAX_GAP {
                let elevation_quality = (total_elevation / 2.0) / threshold;
                let separation_quality =
                    if (DOUBLE_SEPARATION.0..=DOUBLE_SEPARATION.1).contains(&separation) {
                        1.0
                    } else {
                        0.7
                    };
                let confidence =
                    (elevation_quality * 0.6 + separation_quality * 0.4) * DOUBLE_SCALE;
                return DetectionResult::detected(
                    PatternType::DoubleBump,
                    confidence,
                    first_bump,
                    window,
                );
            }
        }

        // A run this long is a slope or noise rather than a bump.
        if in_bump && i - current_start > DOUBLE_MAX_RUN {
            in_bump = false;
            max_elevation = 0.0;
        }

        if bump_count == 1 && !in_bump && i - last_bump_end > DOUBLE_MAX_GAP {
            bump_count = 0;
            total_elevation = 0.0;
        }
    }

    DetectionResult::undetected(window)
}

/// Compares the rise and descent phases of a bump; 1.0 is a perfect mirror.
pub fn symmetry_factor(
    data: &[f32],
    rise_start: usize,
    elevation_start: usize,
    elevation_end: usize,
    descent_end: usize,
) -> f32 {
    if rise_start >= elevation_start
        || elevation_start >= elevation_end
        || elevation_end >= descent_end
        || descent_end > data.len()
    {
        return SYMMETRY_FALLBACK;
    }

    let rise_len = elevation_start - rise_start;
    let descent_len = descent_end - elevation_end;
    let length_ratio = (rise_len as f32 / descent_len as f32)
        .min(descent_len as f32 / rise_len as f32);

    let rise_rate = mean_step(&data[rise_start..elevation_start], rise_len);
    let descent_rate = mean_step(&data[elevation_end..descent_end], descent_len);
    let rate_ratio = (rise_rate / descent_rate.max(RATE_FLOOR))
        .min(descent_rate / rise_rate.max(RATE_FLOOR));

    length_ratio * 0.7 + rate_ratio * 0.3
}

fn mean_step(phase: &[f32], phase_len: usize) -> f32 {
    let total: f32 = phase.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / phase_len.saturating_sub(1).max(1) as f32
}
