//! Hearing range test: a sequence of test frequencies and the listener's answers.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::ToneError;
use crate::params::{MAX_FREQUENCY, MIN_FREQUENCY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestStep {
    #[default]
    Octave,
    HalfOctave,
    ThirdOctave,
}

impl TestStep {
    pub fn ratio(self) -> f64 {
        match self {
            TestStep::Octave => 2.0,
            TestStep::HalfOctave => std::f64::consts::SQRT_2,
            TestStep::ThirdOctave => 2f64.powf(1.0 / 3.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOrder {
    #[default]
    Ascending,
    Descending,
    Random,
}

/// Geometric frequency ladder from `start` up to `end`, rounded to 0.1 Hz.
pub fn test_frequencies<R: Rng + ?Sized>(
    start: f64,
    end: f64,
    step: TestStep,
    order: TestOrder,
    rng: &mut R,
) -> Result<Vec<f64>, ToneError> {
    if !(start.is_finite() && (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&start)) {
        return Err(ToneError::invalid("start", format!("start frequency {start} out of range")));
    }
    if !(end.is_finite() && end >= start) {
        return Err(ToneError::invalid("end", format!("end frequency {end} below start {start}")));
    }

    let ratio = step.ratio();
    let mut frequencies = Vec::new();
    let mut current = start;
    while current <= end {
        frequencies.push((current * 10.0).round() / 10.0);
        current *= ratio;
    }

    match order {
        TestOrder::Ascending => {}
        TestOrder::Descending => frequencies.reverse(),
        TestOrder::Random => frequencies.shuffle(rng),
    }
    Ok(frequencies)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub frequency: f64,
    pub heard: bool,
}

/// Lowest and highest frequencies the listener reported hearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HearingRange {
    pub lowest_hz: f64,
    pub highest_hz: f64,
}

/// Walks a listener through a frequency sequence.
#[derive(Debug, Clone)]
pub struct HearingTest {
    frequencies: Vec<f64>,
    responses: Vec<TestResponse>,
}

impl HearingTest {
    pub fn new(frequencies: Vec<f64>) -> Self {
        HearingTest {
            frequencies,
            responses: Vec::new(),
        }
    }

    pub fn generate(start: f64, end: f64, step: TestStep, order: TestOrder) -> Result<Self, ToneError> {
        let frequencies = test_frequencies(start, end, step, order, &mut rand::thread_rng())?;
        Ok(Self::new(frequencies))
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn responses(&self) -> &[TestResponse] {
        &self.responses
    }

    /// Frequency awaiting an answer, or `None` when the test is over.
    pub fn current(&self) -> Option<f64> {
        self.frequencies.get(self.responses.len()).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.current().is_none()
    }

    /// 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.frequencies.is_empty() {
            1.0
        } else {
            self.responses.len() as f64 / self.frequencies.len() as f64
        }
    }

    /// Record the answer for the current frequency and move on.
    /// Returns the next frequency to play.
    pub fn record(&mut self, heard: bool) -> Option<f64> {
        let frequency = self.current()?;
        self.responses.push(TestResponse { frequency, heard });
        self.current()
    }

    /// `None` if nothing was heard.
    pub fn range(&self) -> Option<HearingRange> {
        let heard = self.responses.iter().filter(|r| r.heard).map(|r| r.frequency);
        heard.fold(None, |range, f| match range {
            None => Some(HearingRange {
                lowest_hz: f,
                highest_hz: f,
            }),
            Some(r) => Some(HearingRange {
                lowest_hz: r.lowest_hz.min(f),
                highest_hz: r.highest_hz.max(f),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn octave_ladder() {
        let mut rng = StdRng::seed_from_u64(1);
        let f = test_frequencies(20.0, 20_000.0, TestStep::Octave, TestOrder::Ascending, &mut rng).unwrap();
        assert_eq!(
            f,
            vec![20.0, 40.0, 80.0, 160.0, 320.0, 640.0, 1280.0, 2560.0, 5120.0, 10240.0]
        );
    }

    #[test]
    fn finer_steps_round_to_tenths() {
        let mut rng = StdRng::seed_from_u64(1);
        let f = test_frequencies(100.0, 250.0, TestStep::HalfOctave, TestOrder::Ascending, &mut rng).unwrap();
        assert_eq!(f, vec![100.0, 141.4, 200.0]);

        let third = test_frequencies(100.0, 200.0, TestStep::ThirdOctave, TestOrder::Descending, &mut rng).unwrap();
        assert_eq!(third, vec![200.0, 158.7, 126.0, 100.0]);
    }

    #[test]
    fn random_order_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut shuffled =
            test_frequencies(20.0, 20_000.0, TestStep::ThirdOctave, TestOrder::Random, &mut rng).unwrap();
        let ascending =
            test_frequencies(20.0, 20_000.0, TestStep::ThirdOctave, TestOrder::Ascending, &mut rng).unwrap();
        shuffled.sort_by(f64::total_cmp);
        assert_eq!(shuffled, ascending);
    }

    #[test]
    fn rejects_bad_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(test_frequencies(0.0, 100.0, TestStep::Octave, TestOrder::Ascending, &mut rng).is_err());
        assert!(test_frequencies(500.0, 100.0, TestStep::Octave, TestOrder::Ascending, &mut rng).is_err());
    }

    #[test]
    fn walks_through_responses() {
        let mut test = HearingTest::new(vec![20.0, 1000.0, 16_000.0, 19_000.0]);
        assert_eq!(test.current(), Some(20.0));
        assert_eq!(test.record(false), Some(1000.0));
        assert_eq!(test.record(true), Some(16_000.0));
        assert_eq!(test.record(true), Some(19_000.0));
        assert_eq!(test.record(false), None);
        assert!(test.is_complete());
        assert_eq!(test.progress(), 1.0);
        assert_eq!(test.record(true), None, "answers after the end are ignored");
        assert_eq!(test.responses().len(), 4);

        let range = test.range().unwrap();
        assert_eq!(range.lowest_hz, 1000.0);
        assert_eq!(range.highest_hz, 16_000.0);
    }

    #[test]
    fn nothing_heard_has_no_range() {
        let mut test = HearingTest::generate(1000.0, 4000.0, TestStep::Octave, TestOrder::Random).unwrap();
        while test.record(false).is_some() {}
        assert!(test.range().is_none());
    }
}
