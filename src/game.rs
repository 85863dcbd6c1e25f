//! The `guess` builtin: find a number between 1 and 100 in six attempts.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_ATTEMPTS: u32 = 6;
pub const LOWEST: u32 = 1;
pub const HIGHEST: u32 = 100;

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// Guessed right on the given attempt.
    Won { attempts: u32 },
    /// Used up every attempt.
    Lost,
    /// Input ran out before the game was decided.
    Abandoned,
}

pub struct GuessingGame {
    target: u32,
}

impl GuessingGame {
    pub fn new(target: u32) -> Self {
        Self { target }
    }

    /// Picks a target with a generator seeded from the wall clock.
    pub fn from_clock() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(rng.gen_range(LOWEST..=HIGHEST))
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// Runs the game, reading whitespace-separated guesses from `input`.
    ///
    /// Guesses that do not parse to a positive number are rejected without using up
    /// an attempt.
    pub fn play(&self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<GameResult> {
        let mut words = Words::new(input);

        writeln!(output, "Welcome to the Guessing Game!")?;
        writeln!(
            output,
            "You have {} chances to guess the magic number between {} and {}.",
            MAX_ATTEMPTS, LOWEST, HIGHEST
        )?;

        for attempt in 1..=MAX_ATTEMPTS {
            let guess = loop {
                write!(output, "Guess #{}: ", attempt)?;
                output.flush()?;
                let Some(word) = words.next_word()? else {
                    writeln!(output)?;
                    return Ok(GameResult::Abandoned);
                };
                let value = parse_leading_int(&word);
                if value > 0 {
                    break value as u64;
                }
                writeln!(output, "Invalid Input! Enter an int between {} and {}.", LOWEST, HIGHEST)?;
            };

            let target = u64::from(self.target);
            if guess > target {
                writeln!(output, "Your guess is too high.")?;
            } else if guess < target {
                writeln!(output, "Your guess is too low.")?;
            } else {
                writeln!(output, "Your guess is correct!")?;
                return Ok(GameResult::Won { attempts: attempt });
            }
        }

        writeln!(output, "You ran out of guesses!")?;
        writeln!(output, "The magic number was {}", self.target)?;
        Ok(GameResult::Lost)
    }
}

/// Reads `input` one whitespace-separated word at a time.
struct Words<'a> {
    input: &'a mut dyn BufRead,
    pending: VecDeque<String>,
}

impl<'a> Words<'a> {
    fn new(input: &'a mut dyn BufRead) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }

    fn next_word(&mut self) -> std::io::Result<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(self.pending.pop_front())
    }
}

/// Parses an optional sign followed by leading digits, ignoring whatever follows.
///
/// Anything without leading digits is 0. Values beyond `i64` saturate.
fn parse_leading_int(word: &str) -> i64 {
    static LEADING_INT: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_INT.get_or_init(|| Regex::new(r"^\s*([+-]?)([0-9]+)").expect("valid regex"));

    let Some(caps) = re.captures(word) else {
        return 0;
    };
    let negative = &caps[1] == "-";
    let magnitude = caps[2]
        .bytes()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative { -magnitude } else { magnitude }
}
