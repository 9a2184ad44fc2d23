use num_traits::Float;

fn len_as<T: Float>(data: &[T]) -> T {
    T::from(data.len()).unwrap_or_else(T::one)
}

pub fn mean<T: Float>(data: &[T]) -> T {
    if data.is_empty() {
        return T::zero();
    }
    data.iter().fold(T::zero(), |acc, &x| acc + x) / len_as(data)
}

/// Population standard deviation (divisor n).
pub fn std_dev<T: Float>(data: &[T]) -> T {
    if data.is_empty() {
        return T::zero();
    }
    let m = mean(data);
    let ss = data.iter().fold(T::zero(), |acc, &x| acc + (x - m) * (x - m));
    (ss / len_as(data)).sqrt()
}

/// Sample standard deviation (divisor n - 1); zero for fewer than two values.
pub fn sample_std_dev<T: Float>(data: &[T]) -> T {
    if data.len() < 2 {
        return T::zero();
    }
    let m = mean(data);
    let ss = data.iter().fold(T::zero(), |acc, &x| acc + (x - m) * (x - m));
    (ss / (len_as(data) - T::one())).sqrt()
}

/// Least-squares line over the sample index: returns (slope, intercept).
pub fn linear_fit(segment: &[f64]) -> (f64, f64) {
    let n = segment.len();
    if n < 2 {
        let mean = segment.iter().copied().next().unwrap_or(0.0);
        return (0.0, mean);
    }
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_xy = 0.0;
    for (i, &y) in segment.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }
    let n_f = n as f64;
    let denom = n_f * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        let mean = sum_y / n_f;
        return (0.0, mean);
    }
    let slope = (n_f * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n_f;
    (slope, intercept)
}

/// Remove the best-fit straight line.
pub fn detrend_linear(data: &[f64]) -> Vec<f64> {
    let (slope, intercept) = linear_fit(data);
    data.iter()
        .enumerate()
        .map(|(i, &y)| y - (slope * i as f64 + intercept))
        .collect()
}
