//! Console stand-in for the dialogs and status widgets of the desktop UI.
use std::io::{self, BufRead, Write};

use chatlog_core::{CheckBoxItem, ServerIdForm};
use chatlog_engine::{BatchSummary, ChoiceKind, Decision, ImportOutcome, ProgressChannel, UiRequest};
use engine_logging::engine_debug;

pub struct ConsolePresenter<R, W> {
    input: R,
    output: W,
    /// Answer every prompt with its default without reading input.
    assume_yes: bool,
    last_progress: Vec<ProgressChannel>,
}

impl<R: BufRead, W: Write> ConsolePresenter<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
            last_progress: Vec::new(),
        }
    }

    /// Answers one request from the engine. A closed input cancels the prompt.
    pub fn answer(&mut self, request: UiRequest) -> io::Result<()> {
        match request {
            UiRequest::Confirm {
                title,
                message,
                reply,
            } => {
                let decision = self.confirm(&title, &message)?;
                let _ = reply.send(decision);
            }
            UiRequest::Notify {
                title,
                message,
                reply,
            } => {
                writeln!(self.output, "[{title}] {message}")?;
                let _ = reply.send(());
            }
            UiRequest::AskForServerIds { form, reply } => {
                let mapping = self.fill_server_ids(form)?.map(|form| form.mapping());
                let _ = reply.send(mapping);
            }
        }
        Ok(())
    }

    fn confirm(&mut self, title: &str, message: &str) -> io::Result<Decision> {
        writeln!(self.output, "[{title}] {message}")?;
        if self.assume_yes {
            writeln!(self.output, "> yes")?;
            return Ok(Decision::Yes);
        }
        write!(self.output, "[y/N] ")?;
        self.output.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        Ok(if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
            Decision::Yes
        } else {
            Decision::No
        })
    }

    /// `None` when input ends before every row holds a valid id.
    fn fill_server_ids(&mut self, mut form: ServerIdForm) -> io::Result<Option<ServerIdForm>> {
        writeln!(self.output, "[{}] {}", ServerIdForm::TITLE, ServerIdForm::DESCRIPTION)?;
        if self.assume_yes {
            return Ok(Some(form));
        }

        for index in 0..form.rows().len() {
            loop {
                write!(self.output, "{}: ", form.rows()[index].title)?;
                self.output.flush()?;
                let Some(value) = self.read_line()? else {
                    return Ok(None);
                };
                form.set_value(index, value);
                if form.rows()[index].is_valid() {
                    break;
                }
                writeln!(self.output, "Not a valid id; leave empty to generate one.")?;
            }
        }
        Ok(Some(form))
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prints the visible levels, skipping snapshots that changed nothing visible.
    pub fn show_progress(&mut self, channels: Vec<ProgressChannel>) -> io::Result<()> {
        if channels == self.last_progress {
            return Ok(());
        }
        for channel in channels.iter().filter(|channel| channel.visible) {
            let indent = "  ".repeat(channel.depth);
            if channel.total > 0 {
                writeln!(
                    self.output,
                    "{indent}{} ({}/{})",
                    channel.message, channel.completed, channel.total
                )?;
            } else {
                writeln!(self.output, "{indent}{}", channel.message)?;
            }
        }
        engine_debug!("Progress snapshot with {} levels", channels.len());
        self.last_progress = channels;
        Ok(())
    }

    pub fn show_statistics(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    pub fn show_choices(&mut self, kind: ChoiceKind, items: &[CheckBoxItem<u64>]) -> io::Result<()> {
        writeln!(self.output, "{}:", kind.dialog_title())?;
        for item in items {
            let mark = if item.checked { 'x' } else { ' ' };
            writeln!(self.output, "  [{mark}] {} ({})", item.title, item.item)?;
        }
        Ok(())
    }

    pub fn show_summary(&mut self, summary: &BatchSummary) -> io::Result<()> {
        writeln!(
            self.output,
            "Imported {} of {} file(s), {} skipped, {} failed.",
            summary.succeeded,
            summary.total,
            summary.skipped(),
            summary.failed()
        )?;
        for item in &summary.items {
            match &item.outcome {
                ImportOutcome::Succeeded => {}
                ImportOutcome::Skipped(reason) => {
                    writeln!(self.output, "  skipped {}: {reason}", item.name)?
                }
                ImportOutcome::Failed(error) => {
                    writeln!(self.output, "  failed {}: {error}", item.name)?
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}
