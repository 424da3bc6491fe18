//! Vertical-acceleration offsets (m/s², relative to the resting baseline)
//! of the anomaly shapes injected into synthetic rides, one entry per sample.

/// Sharp drop into the hole followed by an equally sharp rebound.
pub fn pothole(depth: f32) -> Vec<f32> {
    let mut shape = vec![-depth; 3];
    shape.extend(std::iter::repeat(depth).take(3));
    shape
}

/// Ramp up, short plateau, ramp down.
pub fn speed_bump(height: f32) -> Vec<f32> {
    let mut shape = vec![height * 0.35, height * 0.7, height];
    shape.extend(std::iter::repeat(height).take(8));
    shape.extend([height * 0.7, height * 0.35, height * 0.1]);
    shape
}

/// Two short humps separated by a flat gap. Each hump is a two-sample kick
/// followed by a brief suspension rebound below the baseline.
pub fn double_bump(height: f32) -> Vec<f32> {
    let hump = [height, height, -0.4 * height, -0.4 * height];
    let mut shape = hump.to_vec();
    shape.extend(std::iter::repeat(0.0).take(12));
    shape.extend(hump);
    shape
}

/// Pitch-rate spike accompanying a shape of the given length, rad/s.
pub fn pitch_spike(len: usize, peak: f32) -> Vec<f32> {
    let half = len as f32 / 2.0;
    (0..len)
        .map(|i| peak * (1.0 - ((i as f32 + 0.5) - half).abs() / half.max(1.0)))
        .collect()
}
