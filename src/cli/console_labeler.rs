// ============================================================
// Layer 1 — Console Labeler
// ============================================================
// Asks a human about one candidate pair at a time:
//
//   title : chief marketing officer
//   title : marketing director
//
//   2/10 positive, 1 uncertain
//   Do these records refer to the same thing?
//   (y)es / (n)o / (u)nsure / (f)inished / (q)uit without saving
//
// Generic over the reader and writer so tests can drive it.

use std::io::{self, BufRead, Write};

use crate::domain::record::RecordPair;
use crate::domain::traits::{LabelDecision, LabelProgress, Labeler};

pub struct ConsoleLabeler<R: BufRead, W: Write> {
    input:  R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleLabeler<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, pair: &RecordPair, progress: &LabelProgress) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "title : {}", pair.messy.title)?;
        writeln!(self.output, "title : {}", pair.canonical.title)?;
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{}/{} positive, {} uncertain",
            progress.matches,
            progress.matches + progress.distinct,
            progress.uncertain
        )?;
        writeln!(self.output, "Do these records refer to the same thing?")?;
        write!(self.output, "(y)es / (n)o / (u)nsure / (f)inished / (q)uit without saving ")?;
        self.output.flush()
    }
}

impl ConsoleLabeler<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Labeler for ConsoleLabeler<R, W> {
    fn label(&mut self, pair: &RecordPair, progress: &LabelProgress) -> io::Result<LabelDecision> {
        self.prompt(pair, progress)?;
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // end of input: treat like quitting
                writeln!(self.output)?;
                return Ok(LabelDecision::Cancel);
            }

            match parse_answer(&line) {
                Some(decision) => return Ok(decision),
                None => {
                    write!(self.output, "Please answer y, n, u, f or q: ")?;
                    self.output.flush()?;
                }
            }
        }
    }
}

fn parse_answer(line: &str) -> Option<LabelDecision> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes"      => Some(LabelDecision::Match),
        "n" | "no"       => Some(LabelDecision::Distinct),
        "u" | "unsure"   => Some(LabelDecision::Uncertain),
        "f" | "finished" => Some(LabelDecision::Finished),
        "q" | "quit"     => Some(LabelDecision::Cancel),
        _                => None,
    }
}
