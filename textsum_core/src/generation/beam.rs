use crate::error::{PipelineError, PipelineResult};

/// Scores the next token for a batch of decoder prefixes.
pub trait StepScorer {
    /// One row of vocabulary log-probabilities per prefix, in the same order.
    fn log_probs(&mut self, prefixes: &[Vec<u32>]) -> PipelineResult<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, Copy)]
pub struct BeamSearch {
    pub num_beams: usize,
    pub length_penalty: f64,
    /// Upper bound on the decoder sequence, start token included.
    pub max_length: usize,
    pub start_token: u32,
    pub eos_token: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Generated tokens without the start token and without EOS.
    pub tokens: Vec<u32>,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    sum_logprobs: f64,
}

struct FinishedHypotheses {
    capacity: usize,
    length_penalty: f64,
    hyps: Vec<Hypothesis>,
}

impl FinishedHypotheses {
    fn new(capacity: usize, length_penalty: f64) -> Self {
        Self {
            capacity,
            length_penalty,
            hyps: Vec::with_capacity(capacity + 1),
        }
    }

    fn normalize(&self, sum_logprobs: f64, len: usize) -> f64 {
        sum_logprobs / (len.max(1) as f64).powf(self.length_penalty)
    }

    fn worst_score(&self) -> f64 {
        self.hyps
            .iter()
            .map(|h| h.score)
            .fold(f64::INFINITY, f64::min)
    }

    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f64) {
        let score = self.normalize(sum_logprobs, tokens.len());

        if self.hyps.len() < self.capacity || score > self.worst_score() {
            self.hyps.push(Hypothesis { tokens, score });

            if self.hyps.len() > self.capacity {
                if let Some(worst_idx) = self
                    .hyps
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.score.total_cmp(&b.1.score))
                    .map(|(idx, _)| idx)
                {
                    self.hyps.remove(worst_idx);
                }
            }
        }
    }

    fn is_done(&self, best_sum_logprobs: f64, cur_len: usize) -> bool {
        if self.hyps.len() < self.capacity {
            return false;
        }

        self.worst_score() >= self.normalize(best_sum_logprobs, cur_len)
    }

    fn into_best(self) -> Option<Hypothesis> {
        self.hyps
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

impl BeamSearch {
    pub fn run<S: StepScorer + ?Sized>(&self, scorer: &mut S) -> PipelineResult<Hypothesis> {
        let num_beams = self.num_beams.max(1);
        let width = 2 * num_beams;

        let mut beams = vec![Beam {
            tokens: vec![self.start_token],
            sum_logprobs: 0.0,
        }];
        let mut finished = FinishedHypotheses::new(num_beams, self.length_penalty);
        let mut done = false;

        while beams[0].tokens.len() < self.max_length {
            let prefixes: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
            let scores = scorer.log_probs(&prefixes)?;

            if scores.len() != beams.len() {
                return Err(PipelineError::Inference(format!(
                    "scorer returned {} rows for {} beams",
                    scores.len(),
                    beams.len()
                )));
            }

            let mut candidates: Vec<(f64, usize, u32)> = Vec::with_capacity(width * beams.len());
            for (beam_idx, (beam, row)) in beams.iter().zip(scores.iter()).enumerate() {
                for (token, logp) in top_k(row, width) {
                    candidates.push((beam.sum_logprobs + logp as f64, beam_idx, token));
                }
            }
            candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
            candidates.truncate(width);

            let mut next_beams = Vec::with_capacity(num_beams);
            for (rank, (sum_logprobs, beam_idx, token)) in candidates.into_iter().enumerate() {
                if token == self.eos_token {
                    if rank < num_beams {
                        finished.add(beams[beam_idx].tokens.clone(), sum_logprobs);
                    }
                } else {
                    let mut tokens = beams[beam_idx].tokens.clone();
                    tokens.push(token);
                    next_beams.push(Beam {
                        tokens,
                        sum_logprobs,
                    });
                }

                if next_beams.len() == num_beams {
                    break;
                }
            }

            if next_beams.is_empty() {
                done = true;
                break;
            }

            let best = &next_beams[0];
            if finished.is_done(best.sum_logprobs, best.tokens.len()) {
                done = true;
                break;
            }

            beams = next_beams;
        }

        if !done {
            for beam in beams {
                finished.add(beam.tokens, beam.sum_logprobs);
            }
        }

        let mut best = finished
            .into_best()
            .ok_or_else(|| PipelineError::Inference("beam search produced no hypothesis".to_string()))?;

        if best.tokens.first() == Some(&self.start_token) {
            best.tokens.remove(0);
        }

        Ok(best)
    }
}

/// Indices and values of the `k` largest entries of `row`.
fn top_k(row: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indices: Vec<usize> = (0..row.len()).collect();

    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |a, b| row[*b].total_cmp(&row[*a]));
        indices.truncate(k);
    }

    indices.into_iter().map(|i| (i as u32, row[i])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u32 = 0;
    const EOS: u32 = 1;
    const VOCAB: usize = 5;

    struct ScriptedScorer<F: FnMut(&[u32]) -> Vec<f32>> {
        script: F,
        calls: usize,
    }

    impl<F: FnMut(&[u32]) -> Vec<f32>> StepScorer for ScriptedScorer<F> {
        fn log_probs(&mut self, prefixes: &[Vec<u32>]) -> PipelineResult<Vec<Vec<f32>>> {
            self.calls += 1;
            Ok(prefixes.iter().map(|p| (self.script)(p)).collect())
        }
    }

    fn dist(probs: [f32; VOCAB]) -> Vec<f32> {
        probs.iter().map(|p| p.max(1e-6).ln()).collect()
    }

    fn search(num_beams: usize, max_length: usize) -> BeamSearch {
        BeamSearch {
            num_beams,
            length_penalty: 0.8,
            max_length,
            start_token: START,
            eos_token: EOS,
        }
    }

    #[test]
    fn test_top_k() {
        let picked = top_k(&[0.1, 0.9, 0.5, 0.7], 2);
        let mut tokens: Vec<u32> = picked.iter().map(|(t, _)| *t).collect();
        tokens.sort();
        assert_eq!(tokens, vec![1, 3]);
        assert_eq!(top_k(&[0.1, 0.2], 8).len(), 2);
    }

    #[test]
    fn test_stops_at_eos() {
        let mut scorer = ScriptedScorer {
            script: |prefix: &[u32]| match prefix {
                [START] => dist([0.0, 0.0, 0.9, 0.05, 0.05]),
                _ => dist([0.0, 0.95, 0.02, 0.02, 0.01]),
            },
            calls: 0,
        };

        let best = search(2, 16).run(&mut scorer).unwrap();
        assert_eq!(best.tokens, vec![2]);
        assert!(scorer.calls < 16);
    }

    #[test]
    fn test_prefers_better_sequence_over_greedy_choice() {
        let mut scorer = ScriptedScorer {
            script: |prefix: &[u32]| match prefix {
                [START] => dist([0.0, 0.0, 0.6, 0.4, 0.0]),
                [START, 2, ..] => dist([0.0, 0.25, 0.25, 0.25, 0.25]),
                [START, 3, ..] => dist([0.0, 0.9, 0.05, 0.05, 0.0]),
                _ => dist([0.0, 1.0, 0.0, 0.0, 0.0]),
            },
            calls: 0,
        };

        let best = search(2, 8).run(&mut scorer).unwrap();
        assert_eq!(best.tokens, vec![3]);
        let expected = (0.4f64 * 0.9).ln() / 2f64.powf(0.8);
        assert!((best.score - expected).abs() < 1e-3);
    }

    #[test]
    fn test_respects_max_length() {
        let mut scorer = ScriptedScorer {
            script: |_: &[u32]| dist([0.0, 0.0, 0.5, 0.3, 0.2]),
            calls: 0,
        };

        let best = search(3, 4).run(&mut scorer).unwrap();
        assert_eq!(best.tokens.len(), 3);
        assert_eq!(scorer.calls, 3);
        assert!(!best.tokens.contains(&START));
    }

    #[test]
    fn test_rejects_mismatched_scorer_output() {
        struct Broken;
        impl StepScorer for Broken {
            fn log_probs(&mut self, _: &[Vec<u32>]) -> PipelineResult<Vec<Vec<f32>>> {
                Ok(vec![])
            }
        }

        let err = search(2, 8).run(&mut Broken).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }
}
