#![allow(non_snake_case)]

use std::fmt::Display;

use super::model::Hmm;

/// Rescales `row` to sum to 1 and returns the sum before scaling.
///
/// A row that sums to zero is set to 1 everywhere.
fn rescale(row: &mut [f64]) -> f64 {
    let sum: f64 = row.iter().sum();
    if sum != 0.0 {
        for v in row.iter_mut() {
            *v /= sum;
        }
    } else {
        row.fill(1.0);
    }
    sum
}

/// Work space of the Viterbi algorithm.
///
/// Buffers grow to the longest sequence seen and are reused afterwards.
#[derive(Debug, Default, Clone)]
pub struct Trellis {
    /// Also run the forward (sum) recursion next to the max recursion.
    cumulative: bool,
    /// The total number of states (S).
    num_states: usize,
    /// The number of items (T) of the current sequence.
    num_items: usize,
    /// The number of items the buffers can hold.
    cap_items: usize,
    /**
     * Best path scores.
     *  This is a [T][S] matrix whose element [t][s] presents the score of
     *  the best path arriving at (t, s), rescaled per layer for t > 0.
     */
    max_score: Vec<f64>,
    /**
     * Backward edges.
     *  This is a [T][S] matrix whose element [t][j] represents the state #i
     *  at t-1 that yields the maximum score to arrive at (t, j).
     */
    backward_edge: Vec<usize>,
    /**
     * Cumulative scores.
     *  This is a [T][S] matrix whose element [t][s] presents the total
     *  score of all paths arriving at (t, s), rescaled per layer.
     *  Only filled when the cumulative recursion is enabled.
     */
    cum_score: Vec<f64>,
    /// Logarithm of the total score of all paths, from the layer sums.
    log_norm: f64,
}

impl Trellis {
    /// Empty trellis over `S` states with buffers preallocated for
    /// sequences of up to `cap` items. Longer sequences grow the buffers.
    pub fn new(cumulative: bool, S: usize, cap: usize) -> Self {
        let mut this = Self {
            cumulative,
            num_states: S,
            ..Default::default()
        };
        this.resize(cap);
        this.num_items = 0;
        this
    }

    /// Sets the current sequence length to `T`, growing the buffers if needed.
    pub fn resize(&mut self, T: usize) {
        let S = self.num_states;
        self.num_items = T;
        if self.cap_items < T {
            self.max_score.resize(T * S, 0.0);
            self.backward_edge.resize(T * S, 0);
            if self.cumulative {
                self.cum_score.resize(T * S, 0.0);
            }
            self.cap_items = T;
        }
    }

    fn reset(&mut self) {
        let n = self.num_items * self.num_states;
        self.max_score[..n].fill(0.0);
        self.backward_edge[..n].fill(0);
        if self.cumulative {
            self.cum_score[..n].fill(0.0);
        }
        self.log_norm = 0.0;
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    #[inline]
    pub fn is_cumulative(&self) -> bool {
        self.cumulative
    }

    #[inline]
    pub fn score(&self, t: usize, s: usize) -> f64 {
        self.max_score[self.num_states * t + s]
    }

    #[inline]
    pub fn backpointer(&self, t: usize, s: usize) -> usize {
        self.backward_edge[self.num_states * t + s]
    }

    pub fn cum(&self, t: usize, s: usize) -> Option<f64> {
        self.cumulative.then(|| self.cum_score[self.num_states * t + s])
    }

    pub fn layer(&self, t: usize) -> &[f64] {
        &self.max_score[self.num_states * t..self.num_states * (t + 1)]
    }

    /// Total (scaled) score of all paths, i.e. the observation probability.
    pub fn cumulative_probability(&self) -> Option<f64> {
        self.lognorm().map(f64::exp)
    }

    /// Logarithm of the total (scaled) score of all paths.
    pub fn lognorm(&self) -> Option<f64> {
        (self.cumulative && self.num_items > 0).then_some(self.log_norm)
    }

    /// Fills the trellis for `observations` and writes the best path to
    /// `labels`. Returns the rescaled score of the final state.
    ///
    /// `observations` must not be empty and `labels` must be as long.
    pub(crate) fn viterbi(&mut self, hmm: &Hmm, observations: &[usize], labels: &mut [usize]) -> f64 {
        let T = observations.len();
        let S = self.num_states;
        assert!(T > 0, "empty observations");
        assert_eq!(T, labels.len(), "label buffer length mismatch");
        self.resize(T);
        self.reset();

        /* Compute the scores at (0, *). */
        for s in 0..S {
            let score = hmm.start[s] * hmm.emission(s, observations[0]);
            self.max_score[s] = score;
            if self.cumulative {
                self.cum_score[s] = score;
            }
        }
        if self.cumulative {
            self.log_norm = rescale(&mut self.cum_score[..S]).ln();
        }

        /* Compute the scores at (t, *). */
        for t in 1..T {
            let obs = observations[t];
            for j in 0..S {
                let mut max_score = 0.0;
                let mut argmax_score = 0;
                for i in 0..S {
                    /* Transit from (t-1, i) to (t, j). */
                    let score = self.max_score[S * (t - 1) + i] * hmm.trans(i, j);
                    /* Ties keep the lowest source. */
                    if score > max_score {
                        max_score = score;
                        argmax_score = i;
                    }
                }
                self.backward_edge[S * t + j] = argmax_score;
                self.max_score[S * t + j] = max_score * hmm.emission(j, obs);

                if self.cumulative {
                    let mut sum = 0.0;
                    for i in 0..S {
                        sum += self.cum_score[S * (t - 1) + i] * hmm.trans(i, j);
                    }
                    self.cum_score[S * t + j] = sum * hmm.emission(j, obs);
                }
            }

            rescale(&mut self.max_score[S * t..S * (t + 1)]);
            if self.cumulative {
                let sum = rescale(&mut self.cum_score[S * t..S * (t + 1)]);
                self.log_norm += sum.ln();
            }
        }

        /* Find the state at T-1 with the maximum score. */
        let last = &self.max_score[S * (T - 1)..S * T];
        let mut max_score = last[0];
        labels[T - 1] = 0;
        for (i, &score) in last.iter().enumerate().skip(1) {
            if score > max_score {
                max_score = score;
                labels[T - 1] = i;
            }
        }
        /* Tag labels by tracing the backward links. */
        for t in (0..T - 1).rev() {
            labels[t] = self.backward_edge[S * (t + 1) + labels[t + 1]];
        }
        max_score
    }
}

impl Display for Trellis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Trellis unit (max_prob, max_pointer)")?;
        for s in 0..self.num_states {
            for t in 0..self.num_items {
                write!(f, "({:.2}, {}) ", self.score(t, s), self.backpointer(t, s))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init() {
        let S = 9;
        let T = 12;
        let ctx = Trellis::new(true, S, T);
        assert_eq!(ctx.num_items, 0);
        assert_eq!(ctx.cap_items, T);
        assert_eq!(ctx.cum_score.len(), S * T);
        let ctx = Trellis::new(false, S, T);
        assert!(ctx.cum_score.is_empty());
        assert_eq!(ctx.lognorm(), None);
    }

    #[test]
    fn grows_past_capacity() {
        let hmm = Hmm::from_tables(vec![1.0, 1.0], vec![vec![1.0, 1.0], vec![1.0, 1.0]], vec![vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        let mut ctx = Trellis::new(false, 2, 2);
        let mut labels = vec![0; 5];
        ctx.viterbi(&hmm, &[1, 0, 1, 1, 0], &mut labels);
        assert_eq!(labels, vec![1, 0, 1, 1, 0]);
        assert_eq!(ctx.num_items(), 5);
        assert_eq!(ctx.cap_items, 5);
        let mut labels = vec![0; 1];
        ctx.viterbi(&hmm, &[1], &mut labels);
        assert_eq!((ctx.num_items(), ctx.cap_items), (1, 5));
    }

    #[test]
    fn rescale_layer() {
        let mut row = [1.0, 3.0];
        assert_eq!(rescale(&mut row), 4.0);
        assert_eq!(row, [0.25, 0.75]);
        let mut row = [0.0, 0.0, 0.0];
        assert_eq!(rescale(&mut row), 0.0);
        assert_eq!(row, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn tie_keeps_lowest_source() {
        // states 1 and 2 tie at t = 0, everything else is uniform
        let hmm = Hmm::from_tables(
            vec![0.2, 0.4, 0.4],
            vec![vec![1.0; 3]; 3],
            vec![vec![1.0]; 3],
        )
        .unwrap();
        let mut ctx = Trellis::new(false, 3, 0);
        let mut labels = vec![0; 3];
        ctx.viterbi(&hmm, &[0, 0, 0], &mut labels);
        for s in 0..3 {
            assert_eq!(ctx.backpointer(1, s), 1);
            assert_eq!(ctx.backpointer(2, s), 0);
        }
        // the final layer is a three-way tie
        assert_eq!(labels, vec![1, 0, 0]);
    }

    #[test]
    fn zero_layer_falls_back_to_one() {
        // word #1 is never emitted
        let hmm = Hmm::from_tables(
            vec![0.5, 0.5],
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0, 0.0], vec![1.0, 0.0]],
        )
        .unwrap();
        let mut ctx = Trellis::new(true, 2, 0);
        let mut labels = vec![0; 3];
        ctx.viterbi(&hmm, &[0, 1, 0], &mut labels);
        assert_eq!(ctx.layer(1), &[1.0, 1.0]);
        assert_eq!(ctx.cum(1, 0), Some(1.0));
        assert_eq!(ctx.layer(2), &[0.5, 0.5]);
        assert!(ctx.max_score[..6].iter().all(|v| v.is_finite()));
        assert!(ctx.cum_score[..6].iter().all(|v| v.is_finite()));
        assert_eq!(labels, vec![0, 0, 0]);
        assert_eq!(ctx.lognorm(), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn cumulative_is_forward() {
        let hmm = Hmm::from_tables(
            vec![0.5, 0.5],
            vec![vec![0.6, 0.4], vec![0.5, 0.5]],
            vec![vec![0.2, 0.4, 0.4], vec![0.6, 0.5, 0.0]],
        )
        .unwrap();
        let mut ctx = Trellis::new(true, 2, 0);
        let mut labels = vec![0; 2];
        ctx.viterbi(&hmm, &[1, 0], &mut labels);
        // alpha0 = [0.2, 0.25]
        // alpha1 = [(0.2 * 0.6 + 0.25 * 0.5) * 0.2, (0.2 * 0.4 + 0.25 * 0.5) * 0.6] = [0.049, 0.123]
        let total = 0.049 + 0.123;
        assert!((ctx.cum(0, 1).unwrap() - 0.25 / 0.45).abs() < 1e-12);
        assert!((ctx.cum(1, 0).unwrap() - 0.049 / total).abs() < 1e-12);
        assert!((ctx.lognorm().unwrap() - total.ln()).abs() < 1e-12);
        assert!((ctx.cumulative_probability().unwrap() - total).abs() < 1e-12);
        // the max recursion is untouched by the forward one
        assert_eq!(labels, vec![1, 1]);
    }

    #[test]
    fn display() {
        let hmm = Hmm::from_tables(vec![1.0, 0.0], vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![vec![1.0], vec![1.0]])
            .unwrap();
        let mut ctx = Trellis::new(false, 2, 0);
        let mut labels = vec![0; 2];
        ctx.viterbi(&hmm, &[0, 0], &mut labels);
        assert_eq!(
            ctx.to_string(),
            "Trellis unit (max_prob, max_pointer)\n(1.00, 0) (1.00, 0) \n(0.00, 0) (0.00, 0) \n"
        );
    }
}
