//! Conflict prompts.
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Answer to the three-way prompt for a mergeable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Back up and replace with a symlink.
    Overwrite,
    /// Back up and append the source content.
    Append,
    /// Leave the target alone.
    Skip,
}

/// Asks the user how to resolve a conflict.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Three-way prompt for a mergeable target. `None` when no answer
    /// could be read (EOF or invalid input).
    fn choose_conflict(&self, target: &Path) -> Option<ConflictChoice>;

    /// Yes/no prompt for replacing a non-mergeable target; defaults to no.
    fn confirm_overwrite(&self, target: &Path) -> bool;
}

/// [`Prompter`] reading answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn choose_conflict(&self, target: &Path) -> Option<ConflictChoice> {
        let prompt = format!("{} already exists.", target.display());
        select(
            &mut io::stdin().lock(),
            &mut io::stdout(),
            &prompt,
            &CONFLICT_OPTIONS,
        )
        .and_then(|i| CONFLICT_CHOICES.get(i).copied())
    }

    fn confirm_overwrite(&self, target: &Path) -> bool {
        let prompt = format!("{} already exists. Back up and replace it?", target.display());
        confirm(&mut io::stdin().lock(), &mut io::stdout(), &prompt)
    }
}

const CONFLICT_OPTIONS: [&str; 3] = [
    "Overwrite (back up, then link)",
    "Append (back up, then add the repository version at the end)",
    "Skip",
];

const CONFLICT_CHOICES: [ConflictChoice; 3] = [
    ConflictChoice::Overwrite,
    ConflictChoice::Append,
    ConflictChoice::Skip,
];

/// Show numbered `options` and return the zero-based index picked, or
/// `None` on EOF, a read error, or input that is not a listed number.
pub fn select(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
    options: &[&str],
) -> Option<usize> {
    writeln!(output, "\n{prompt}").ok()?;
    for (i, option) in options.iter().enumerate() {
        writeln!(output, "  \x1b[1m{}\x1b[0m) {option}", i + 1).ok()?;
    }
    write!(output, "\nSelect [1-{}]: ", options.len()).ok()?;
    output.flush().ok()?;

    let mut line = String::new();
    if input.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let choice: usize = line.trim().parse().ok()?;
    (1..=options.len()).contains(&choice).then(|| choice - 1)
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> bool {
    if write!(output, "{prompt} [y/N]: ")
        .and_then(|()| output.flush())
        .is_err()
    {
        return false;
    }
    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
