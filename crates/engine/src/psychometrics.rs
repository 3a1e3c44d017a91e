//! Pure psychometric primitives: 1-PL Rasch ability estimation with EAP
//! updates, Fisher information, mastery probability. No I/O, no panics —
//! numeric edge cases are clamped rather than raised, per spec §4.1/§7.

/// Number of equally-spaced quadrature nodes used by `eap_update`, per spec §4.1.
pub const QUADRATURE_POINTS: usize = 41;

/// Divisors at or below this are clamped to this value instead of dividing
/// by (near-)zero, per spec §4.1's numeric-guard rule.
const MIN_DIVISOR: f64 = 1e-6;

/// Floor applied to posterior SE, per spec §4.1 ("SE floored at sqrt(1e-12)").
const MIN_SE: f64 = 1e-6; // sqrt(1e-12)

fn guard_divisor(x: f64) -> f64 {
    if x.abs() <= MIN_DIVISOR { MIN_DIVISOR } else { x }
}

/// 1-PL (Rasch) probability of a correct response.
pub fn p_correct(theta: f64, beta: f64) -> f64 {
    1.0 / (1.0 + (-(theta - beta)).exp())
}

/// Fisher information for a dichotomous 1-PL item.
pub fn info_dichotomous(theta: f64, beta: f64) -> f64 {
    let p = p_correct(theta, beta);
    p * (1.0 - p)
}

/// GPCM category probabilities for a polytomous item with `m` score
/// categories (`k = 0..=m`) and ordered thresholds `tau` (length `m`).
///
/// `tau[j]` is the step difficulty between category `j` and `j+1`.
pub fn gpcm_pmf(theta: f64, tau: &[f64]) -> Vec<f64> {
    let m = tau.len();
    // Cumulative logit sums: z_k = sum_{j<k} (theta - tau[j]), z_0 = 0.
    let mut numerators = Vec::with_capacity(m + 1);
    let mut cumulative: f64 = 0.0;
    numerators.push(cumulative.exp());
    for &t in tau {
        cumulative += theta - t;
        numerators.push(cumulative.exp());
    }
    let denom = guard_divisor(numerators.iter().sum());
    numerators.into_iter().map(|n| n / denom).collect()
}

/// Fisher information for a polytomous GPCM item:
/// `info = sum_k p_k * (k - E[k])^2`.
pub fn info_polytomous(theta: f64, tau: &[f64]) -> f64 {
    let probs = gpcm_pmf(theta, tau);
    let expected: f64 = probs
        .iter()
        .enumerate()
        .map(|(k, p)| k as f64 * p)
        .sum();
    probs
        .iter()
        .enumerate()
        .map(|(k, p)| p * (k as f64 - expected).powi(2))
        .sum()
}

/// Fisher information, dispatching to the dichotomous or polytomous form
/// depending on whether category thresholds are supplied.
pub fn info(theta: f64, beta: f64, tau: Option<&[f64]>) -> f64 {
    match tau {
        Some(t) if !t.is_empty() => info_polytomous(theta, t),
        _ => info_dichotomous(theta, beta),
    }
}

/// A single binomial-style response: `k` correct out of `m` trials (`m=1`
/// for a single dichotomous attempt).
#[derive(Debug, Clone, Copy)]
pub struct Response {
    pub k: u32,
    pub m: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct EapInput {
    pub prior_mu: f64,
    pub prior_sigma: f64,
    pub response: Response,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EapOutput {
    pub theta_hat: f64,
    pub se: f64,
}

/// 41-point equally-spaced quadrature nodes over `[-4, 4]` standard
/// deviations, with uniform weights, per spec §4.1.
fn quadrature_nodes() -> [f64; QUADRATURE_POINTS] {
    let mut nodes = [0.0f64; QUADRATURE_POINTS];
    let half = (QUADRATURE_POINTS - 1) as f64 / 2.0;
    for (i, node) in nodes.iter_mut().enumerate() {
        *node = (i as f64 - half) / half * 4.0;
    }
    nodes
}

/// Expected a posteriori ability update given a prior and one observed
/// response, via 41-point quadrature.
pub fn eap_update(input: EapInput) -> EapOutput {
    let EapInput {
        prior_mu,
        prior_sigma,
        response,
        beta,
    } = input;

    let sigma = guard_divisor(prior_sigma.max(MIN_SE));
    let nodes = quadrature_nodes();
    let weight = 1.0 / QUADRATURE_POINTS as f64;

    let mut total_mass = 0.0;
    let mut weighted_theta = 0.0;
    let mut likelihoods = [0.0f64; QUADRATURE_POINTS];
    let mut thetas = [0.0f64; QUADRATURE_POINTS];

    for (i, &x) in nodes.iter().enumerate() {
        let theta_i = prior_mu + sigma * x;
        let p = p_correct(theta_i, beta).clamp(1e-9, 1.0 - 1e-9);
        let k = response.k as f64;
        let m = response.m as f64;
        let likelihood = p.powf(k) * (1.0 - p).powf(m - k) * weight;

        thetas[i] = theta_i;
        likelihoods[i] = likelihood;
        total_mass += likelihood;
        weighted_theta += likelihood * theta_i;
    }

    let total_mass = guard_divisor(total_mass);
    let theta_hat = weighted_theta / total_mass;

    let variance: f64 = thetas
        .iter()
        .zip(likelihoods.iter())
        .map(|(&theta_i, &l)| l * (theta_i - theta_hat).powi(2))
        .sum::<f64>()
        / total_mass;

    EapOutput {
        theta_hat,
        se: variance.max(MIN_SE * MIN_SE).sqrt(),
    }
}

/// Cold-start bridge from an Elo-style rating to the theta scale.
pub fn elo_to_theta(rating: f64) -> f64 {
    (rating - 1500.0) / 400.0
}

/// Abramowitz–Stegun rational approximation to the standard normal CDF.
fn standard_normal_cdf(z: f64) -> f64 {
    let b1 = 0.319381530;
    let b2 = -0.356563782;
    let b3 = 1.781477937;
    let b4 = -1.821255978;
    let b5 = 1.330274429;
    let p = 0.2316419;
    let c = 0.39894228; // 1/sqrt(2*pi)

    let z_abs = z.abs();
    let t = 1.0 / (1.0 + p * z_abs);
    let poly = t * (b1 + t * (b2 + t * (b3 + t * (b4 + t * b5))));
    let density = c * (-z_abs * z_abs / 2.0).exp();
    let tail = density * poly;

    if z >= 0.0 { 1.0 - tail } else { tail }
}

/// Probability the learner's true ability exceeds the mastery cut, given
/// the posterior `(theta, se)`.
pub fn mastery_probability(theta: f64, se: f64, theta_cut: f64) -> f64 {
    let se = guard_divisor(se.max(MIN_SE));
    standard_normal_cdf((theta - theta_cut) / se).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_correct_is_half_at_matched_ability_and_difficulty() {
        assert!((p_correct(0.0, 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn info_dichotomous_peaks_at_quarter() {
        assert!((info_dichotomous(0.0, 0.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn eap_correct_and_incorrect_diverge() {
        let base = EapInput {
            prior_mu: 0.0,
            prior_sigma: 0.8,
            response: Response { k: 1, m: 1 },
            beta: 0.0,
        };
        let correct = eap_update(base);
        let incorrect = eap_update(EapInput {
            response: Response { k: 0, m: 1 },
            ..base
        });
        assert!(correct.theta_hat > incorrect.theta_hat);
        assert!((correct.theta_hat - incorrect.theta_hat).abs() > 0.0);
    }

    #[test]
    fn eap_se_never_below_floor() {
        let output = eap_update(EapInput {
            prior_mu: 5.0,
            prior_sigma: 0.01,
            response: Response { k: 1, m: 1 },
            beta: -5.0,
        });
        assert!(output.se >= MIN_SE);
    }

    #[test]
    fn elo_to_theta_matches_reference_points() {
        assert_eq!(elo_to_theta(1500.0), 0.0);
        assert_eq!(elo_to_theta(1900.0), 1.0);
    }

    #[test]
    fn mastery_probability_is_half_at_cut() {
        let p = mastery_probability(0.0, 1.0, 0.0);
        assert!((p - 0.5).abs() < 1e-3);
    }

    #[test]
    fn mastery_probability_rises_with_theta() {
        let low = mastery_probability(-1.0, 0.5, 0.0);
        let high = mastery_probability(1.0, 0.5, 0.0);
        assert!(high > low);
    }

    #[test]
    fn gpcm_pmf_sums_to_one() {
        let probs = gpcm_pmf(0.3, &[-0.5, 0.0, 0.5]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn info_dispatches_to_polytomous_when_tau_given() {
        let tau = vec![-0.5, 0.5];
        let poly = info(0.0, 0.0, Some(&tau));
        let dich = info(0.0, 0.0, None);
        assert!(poly > 0.0);
        assert!(dich > 0.0);
    }
}
