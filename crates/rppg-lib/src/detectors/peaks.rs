//! Local-maximum peak picking with spacing and prominence constraints.

/// Acceptance rules for candidate peaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum height above the higher of the two surrounding bases.
    pub min_prominence: f64,
    /// Minimum index distance between kept peaks; rounded up.
    pub min_distance: f64,
}

/// Indices of peaks in `data` satisfying `criteria`, ascending.
///
/// Spacing is enforced first, keeping the taller peak of any pair that is
/// too close; prominence is checked on the survivors.
pub fn find_peaks(data: &[f64], criteria: PeakCriteria) -> Vec<usize> {
    let mut peaks = local_maxima(data);
    if criteria.min_distance > 1.0 {
        peaks = select_by_distance(data, &peaks, criteria.min_distance.ceil() as usize);
    }
    peaks
        .into_iter()
        .filter(|&p| prominence(data, p) >= criteria.min_prominence)
        .collect()
}

/// Strict local maxima; a flat top counts once, at its middle sample.
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(data: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    // Tallest first; ties resolved towards the later peak.
    order.sort_by(|&a, &b| data[peaks[a]].total_cmp(&data[peaks[b]]).then(a.cmp(&b)));
    for &i in order.iter().rev() {
        if !keep[i] {
            continue;
        }
        let mut j = i;
        while j > 0 && peaks[i] - peaks[j - 1] < distance {
            keep[j - 1] = false;
            j -= 1;
        }
        let mut j = i + 1;
        while j < peaks.len() && peaks[j] - peaks[i] < distance {
            keep[j] = false;
            j += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Height of `peak` above the higher of its left and right bases.
pub fn prominence(data: &[f64], peak: usize) -> f64 {
    let height = data[peak];
    let mut left_min = height;
    for &v in data[..peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }
    let mut right_min = height;
    for &v in &data[peak + 1..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }
    height - left_min.max(right_min)
}
