//! Line-oriented prompting over any reader and writer.
//!
//! Generic so tests can script a session with a byte slice and capture
//! the output in a `Vec<u8>`.

use std::io::Write;

use agritrace_core::ValidationError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::CliError;

/// Prompts on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Create a prompter over the given streams.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Write one line of output.
    pub fn say(&mut self, text: &str) -> Result<(), CliError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    /// Show `prompt` and read one line, without its line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::EndOfInput`] when the input is exhausted.
    pub async fn read_line(&mut self, prompt: &str) -> Result<String, CliError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Err(CliError::EndOfInput);
        }
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(line)
    }

    /// Ask until `validate` accepts the answer, printing each rejection.
    pub async fn ask_until_valid<T, F>(&mut self, prompt: &str, mut validate: F) -> Result<T, CliError>
    where
        F: FnMut(&str) -> Result<T, ValidationError>,
    {
        loop {
            let answer = self.read_line(prompt).await?;
            match validate(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => self.say(&format!("  ! {e}"))?,
            }
        }
    }

    /// Ask for an optional value: a blank answer is `None`, anything else
    /// must pass `validate`.
    pub async fn ask_optional<T, F>(
        &mut self,
        prompt: &str,
        mut validate: F,
    ) -> Result<Option<T>, CliError>
    where
        F: FnMut(&str) -> Result<T, ValidationError>,
    {
        self.ask_until_valid(prompt, |raw| {
            if raw.trim().is_empty() {
                Ok(None)
            } else {
                validate(raw).map(Some)
            }
        })
        .await
    }

    /// Consume the prompter and return the output stream.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
