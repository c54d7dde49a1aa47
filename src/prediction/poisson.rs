/// Highest goal count tracked per side; mass beyond it is folded back by renormalising.
pub const MAX_GOALS: usize = 10;

/// Rates above this are capped before building a distribution
pub const MAX_RATE: f64 = MAX_GOALS as f64;

fn ln_factorial(n: u32) -> f64 {
    (2..=n).map(|i| f64::from(i).ln()).sum()
}

/// Probability of exactly `k` goals for a Poisson rate `lambda`
#[inline]
pub fn pmf(k: u32, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    (f64::from(k) * lambda.ln() - lambda - ln_factorial(k)).exp()
}

/// Probability of at most `k` goals
pub fn cdf(k: u32, lambda: f64) -> f64 {
    (0..=k).map(|i| pmf(i, lambda)).sum()
}

/// Clamp a rate to something the distribution can use
fn sanitize(lambda: f64) -> f64 {
    if lambda.is_finite() && lambda > 0.0 {
        lambda.min(MAX_RATE)
    } else {
        0.0
    }
}

/// Goal-count distribution over `0..=MAX_GOALS`, summing to one
pub fn goal_distribution(lambda: f64) -> [f64; MAX_GOALS + 1] {
    let lambda = sanitize(lambda);
    let mut dist = [0.0; MAX_GOALS + 1];
    for (k, p) in dist.iter_mut().enumerate() {
        *p = pmf(k as u32, lambda);
    }
    let total: f64 = dist.iter().sum();
    if total <= 0.0 || total.is_nan() {
        dist = [0.0; MAX_GOALS + 1];
        dist[MAX_GOALS] = 1.0;
        return dist;
    }
    for p in dist.iter_mut() {
        *p /= total;
    }
    dist
}

/// Joint distribution of home and away goals, assuming independent Poisson scoring
#[derive(Debug, Clone)]
pub struct ScoreGrid {
    cells: [[f64; MAX_GOALS + 1]; MAX_GOALS + 1],
}

impl ScoreGrid {
    pub fn from_rates(home_rate: f64, away_rate: f64) -> Self {
        let home = goal_distribution(home_rate);
        let away = goal_distribution(away_rate);
        let mut cells = [[0.0; MAX_GOALS + 1]; MAX_GOALS + 1];
        for (home_goals, row) in cells.iter_mut().enumerate() {
            for (away_goals, cell) in row.iter_mut().enumerate() {
                *cell = home[home_goals] * away[away_goals];
            }
        }
        Self { cells }
    }

    /// Probability of the exact score
    pub fn get(&self, home_goals: usize, away_goals: usize) -> f64 {
        self.cells[home_goals][away_goals]
    }

    fn sum_where(&self, predicate: impl Fn(usize, usize) -> bool) -> f64 {
        let mut sum = 0.0;
        for (home_goals, row) in self.cells.iter().enumerate() {
            for (away_goals, cell) in row.iter().enumerate() {
                if predicate(home_goals, away_goals) {
                    sum += cell;
                }
            }
        }
        sum
    }

    /// Total goals strictly above `line`
    pub fn over(&self, line: f64) -> f64 {
        self.sum_where(|h, a| (h + a) as f64 > line)
    }

    /// Total goals strictly below `line`
    pub fn under(&self, line: f64) -> f64 {
        self.sum_where(|h, a| ((h + a) as f64) < line)
    }

    pub fn btts(&self) -> f64 {
        self.sum_where(|h, a| h > 0 && a > 0)
    }

    pub fn home_win(&self) -> f64 {
        self.sum_where(|h, a| h > a)
    }

    pub fn draw(&self) -> f64 {
        self.sum_where(|h, a| h == a)
    }

    pub fn away_win(&self) -> f64 {
        self.sum_where(|h, a| h < a)
    }
}
