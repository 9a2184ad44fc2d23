/// Solve the dense system `a · x = b` by Gaussian elimination with partial
/// pivoting. `a` is row-major and square. Returns `None` when singular.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Solve a tridiagonal system with the Thomas algorithm.
///
/// Row `i` reads `sub[i] · x[i-1] + diag[i] · x[i] + sup[i] · x[i+1] = b[i]`;
/// `sub[0]` and the last `sup` are ignored. No pivoting, so the matrix should
/// be diagonally dominant. Returns `None` on a zero pivot.
pub fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    let n = diag.len();
    if n == 0 || sub.len() != n || sup.len() != n || b.len() != n {
        return None;
    }
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];
    let mut prev_c = 0.0;
    let mut prev_d = 0.0;
    for i in 0..n {
        let lower = if i == 0 { 0.0 } else { sub[i] };
        let pivot = diag[i] - lower * prev_c;
        if pivot.abs() < 1e-300 {
            return None;
        }
        c[i] = if i + 1 < n { sup[i] / pivot } else { 0.0 };
        d[i] = (b[i] - lower * prev_d) / pivot;
        prev_c = c[i];
        prev_d = d[i];
    }
    let mut x = d;
    for i in (0..n - 1).rev() {
        x[i] -= c[i] * x[i + 1];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
