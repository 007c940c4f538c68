use rand::Rng;

use super::model::Hmm;

/// Draws an index with probability proportional to its weight.
///
/// Weights need not sum to 1. Returns `None` for an all-zero row.
fn vector_sample<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let dice = rng.random::<f64>() * total;
    let mut cum = 0.0;
    for (n, w) in weights.iter().enumerate() {
        cum += w;
        if dice < cum {
            return Some(n);
        }
    }
    // rounding can leave dice just above the last partial sum
    weights.iter().rposition(|&w| w > 0.0)
}

impl Hmm {
    /// Random walk of `steps` (state, observation) pairs.
    ///
    /// The walk ends early when it reaches a state that emits nothing or
    /// never transitions out.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, steps: usize) -> Vec<(usize, usize)> {
        let mut walk = Vec::with_capacity(steps);
        let Some(mut state) = vector_sample(self.start(), rng) else {
            return walk;
        };
        for step in 0..steps {
            let Some(obs) = vector_sample(self.emiss_row(state), rng) else {
                break;
            };
            walk.push((state, obs));
            if step + 1 == steps {
                break;
            }
            match vector_sample(self.trans_row(state), rng) {
                Some(next) => state = next,
                None => break,
            }
        }
        log::debug!("sampled {} of {} steps", walk.len(), steps);
        walk
    }
}
