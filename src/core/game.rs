use crate::utils::error::{ProjectError, Result};
use rand::Rng;
use std::cmp::Ordering;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    TooLow,
    TooHigh,
    Correct { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct GuessingGame {
    secret: i64,
    low: i64,
    high: i64,
    attempts: u32,
}

impl GuessingGame {
    pub fn new(secret: i64, low: i64, high: i64) -> Self {
        Self {
            secret,
            low,
            high,
            attempts: 0,
        }
    }

    /// Draws the secret uniformly from `low..=high`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> Self {
        Self::new(rng.random_range(low..=high), low, high)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn guess(&mut self, value: i64) -> GuessOutcome {
        self.attempts += 1;
        match value.cmp(&self.secret) {
            Ordering::Less => GuessOutcome::TooLow,
            Ordering::Greater => GuessOutcome::TooHigh,
            Ordering::Equal => GuessOutcome::Correct {
                attempts: self.attempts,
            },
        }
    }
}

/// Runs the interactive loop until the secret is found and returns the
/// number of counted attempts. Lines that are not integers are rejected
/// without counting.
pub fn play<R: BufRead, W: Write>(game: &mut GuessingGame, input: R, mut output: W) -> Result<u32> {
    writeln!(output, "Welcome to the Number Guessing Game!")?;
    writeln!(
        output,
        "I'm thinking of a number between {} and {}.",
        game.low, game.high
    )?;

    let mut lines = input.lines();
    loop {
        write!(output, "Enter your guess: ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            return Err(ProjectError::InputClosed);
        };
        let line = line?;

        let value = match line.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                writeln!(output, "Invalid input. Please enter a number.")?;
                continue;
            }
        };

        match game.guess(value) {
            GuessOutcome::TooLow => writeln!(output, "Too low! Try again.")?,
            GuessOutcome::TooHigh => writeln!(output, "Too high! Try again.")?,
            GuessOutcome::Correct { attempts } => {
                writeln!(
                    output,
                    "Congratulations! You guessed the number in {} attempts.",
                    attempts
                )?;
                tracing::debug!("Game finished after {} attempts", attempts);
                return Ok(attempts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_guess_outcomes() {
        let mut game = GuessingGame::new(42, 1, 100);
        assert_eq!(game.guess(10), GuessOutcome::TooLow);
        assert_eq!(game.guess(90), GuessOutcome::TooHigh);
        assert_eq!(game.guess(42), GuessOutcome::Correct { attempts: 3 });
        assert_eq!(game.attempts(), 3);
    }

    #[test]
    fn test_random_secret_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let game = GuessingGame::random(&mut rng, 1, 100);
            assert!((1..=100).contains(&game.secret));
        }
    }

    #[test]
    fn test_play_transcript() {
        let mut game = GuessingGame::new(50, 1, 100);
        let input = b"25\nabc\n75\n50\n".as_slice();
        let mut output = Vec::new();

        let attempts = play(&mut game, input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert_eq!(attempts, 3);
        assert!(text.starts_with("Welcome to the Number Guessing Game!"));
        assert!(text.contains("between 1 and 100"));
        assert!(text.contains("Too low! Try again."));
        assert!(text.contains("Invalid input. Please enter a number."));
        assert!(text.contains("Too high! Try again."));
        assert!(text.contains("Congratulations! You guessed the number in 3 attempts."));
    }

    #[test]
    fn test_play_input_closed() {
        let mut game = GuessingGame::new(50, 1, 100);
        let input = b"1\n2\n".as_slice();
        let err = play(&mut game, input, Vec::new()).unwrap_err();
        assert!(matches!(err, ProjectError::InputClosed));
        assert_eq!(game.attempts(), 2);
    }
}
