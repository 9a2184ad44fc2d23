use crate::dsp::linalg;

/// Cubic spline with not-a-knot end conditions.
///
/// Evaluation outside the knot range extends the first or last polynomial
/// piece.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit through `(x[i], y[i])`. Needs at least four strictly increasing knots.
    pub fn not_a_knot(x: &[f64], y: &[f64]) -> Option<Self> {
        let n = x.len();
        if n < 4 || y.len() != n {
            return None;
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) || y.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let inner = n - 2;
        let mut sub = vec![0.0; inner];
        let mut diag = vec![0.0; inner];
        let mut sup = vec![0.0; inner];
        let mut rhs = vec![0.0; inner];
        for k in 0..inner {
            let i = k + 1;
            sub[k] = h[i - 1];
            diag[k] = 2.0 * (h[i - 1] + h[i]);
            sup[k] = h[i];
            rhs[k] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        }
        // Not-a-knot ends: m[0] and m[n-1] are linear in their two
        // neighbours, so fold them into the first and last interior rows.
        let (h0, h1) = (h[0], h[1]);
        diag[0] += h0 * (h0 + h1) / h1;
        sup[0] -= h0 * h0 / h1;
        let (ha, hb) = (h[n - 3], h[n - 2]);
        diag[inner - 1] += hb * (ha + hb) / ha;
        sub[inner - 1] -= hb * hb / ha;

        let interior = linalg::solve_tridiagonal(&sub, &diag, &sup, &rhs)?;
        let mut m = Vec::with_capacity(n);
        m.push(((h0 + h1) * interior[0] - h0 * interior[1]) / h1);
        m.extend_from_slice(&interior);
        m.push(((ha + hb) * interior[inner - 1] - hb * interior[inner - 2]) / ha);
        if !m.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let last = self.x.len() - 2;
        let i = self.x.partition_point(|&knot| knot <= t).saturating_sub(1).min(last);
        let h = self.x[i + 1] - self.x[i];
        let dt = t - self.x[i];
        let slope = (self.y[i + 1] - self.y[i]) / h - h * (2.0 * self.m[i] + self.m[i + 1]) / 6.0;
        let curvature = self.m[i] / 2.0;
        let jerk = (self.m[i + 1] - self.m[i]) / (6.0 * h);
        self.y[i] + dt * (slope + dt * (curvature + dt * jerk))
    }

    /// Sample the spline at `fs` Hz over `[x0, x_last)`.
    pub fn resample(&self, fs: f64) -> Vec<f64> {
        let start = self.x[0];
        let end = self.x[self.x.len() - 1];
        let count = ((end - start) * fs).ceil().max(0.0) as usize;
        (0..count)
            .map(|i| start + i as f64 / fs)
            .filter(|&t| t < end)
            .map(|t| self.eval(t))
            .collect()
    }
}
