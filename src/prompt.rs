use crate::error::{ErrorContext, TmError};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, BufRead, IsTerminal, Write};

/// Exit status for an interrupted prompt, mirroring shell SIGINT convention.
const INTERRUPT_EXIT_CODE: i32 = 130;

/// Read a password without echoing it. On a terminal this switches to raw
/// mode and prints `*` per keystroke; Ctrl-C restores the terminal and exits
/// with status 130. When stdin is piped, one line is read verbatim instead.
pub fn read_password(prompt: &str) -> Result<String, TmError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        let mut lock = stdin.lock();
        return take_line(&mut lock)?
            .ok_or_else(|| TmError::Validation("Password input ended unexpectedly".into()));
    }

    let mut stdout = io::stdout();
    write!(stdout, "{prompt}").tm_config_err("Failed to write prompt")?;
    stdout.flush().tm_config_err("Failed to write prompt")?;

    enable_raw_mode().tm_config_err("Failed to enter raw terminal mode")?;
    let outcome = read_masked(&mut stdout);
    disable_raw_mode().tm_config_err("Failed to restore terminal mode")?;
    let _ = writeln!(stdout);

    match outcome {
        MaskedOutcome::Entered(password) => Ok(password),
        MaskedOutcome::Interrupted => std::process::exit(INTERRUPT_EXIT_CODE),
        MaskedOutcome::Failed(err) => Err(err),
    }
}

/// Print a prompt and read one line from stdin. Returns `None` at EOF, which
/// interactive loops treat as "done".
pub fn read_line(prompt: &str) -> Result<Option<String>, TmError> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}").tm_config_err("Failed to write prompt")?;
    stdout.flush().tm_config_err("Failed to write prompt")?;
    let stdin = io::stdin();
    let mut lock = stdin.lock();
    take_line(&mut lock)
}

enum MaskedOutcome {
    Entered(String),
    Interrupted,
    Failed(TmError),
}

fn read_masked(stdout: &mut impl Write) -> MaskedOutcome {
    let mut buffer = String::new();
    loop {
        let evt = match event::read() {
            Ok(evt) => evt,
            Err(err) => {
                return MaskedOutcome::Failed(TmError::Config(format!(
                    "Failed to read key event: {err}"
                )));
            }
        };
        let Event::Key(key) = evt else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return MaskedOutcome::Entered(buffer),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return MaskedOutcome::Interrupted;
            }
            KeyCode::Backspace => {
                if buffer.pop().is_some() {
                    let _ = write!(stdout, "\u{8} \u{8}");
                    let _ = stdout.flush();
                }
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                let _ = write!(stdout, "*");
                let _ = stdout.flush();
            }
            _ => {}
        }
    }
}

fn take_line(reader: &mut impl BufRead) -> Result<Option<String>, TmError> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .tm_config_err("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_take_line_strips_newline() {
        let mut input = Cursor::new(b"hunter2\n".to_vec());
        assert_eq!(take_line(&mut input).unwrap(), Some("hunter2".to_string()));
    }

    #[test]
    fn test_take_line_strips_crlf() {
        let mut input = Cursor::new(b"hunter2\r\n".to_vec());
        assert_eq!(take_line(&mut input).unwrap(), Some("hunter2".to_string()));
    }

    #[test]
    fn test_take_line_keeps_interior_whitespace() {
        let mut input = Cursor::new(b"  pass word  \n".to_vec());
        assert_eq!(
            take_line(&mut input).unwrap(),
            Some("  pass word  ".to_string())
        );
    }

    #[test]
    fn test_take_line_eof_is_none() {
        let mut input = Cursor::new(Vec::new());
        assert_eq!(take_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_take_line_last_line_without_newline() {
        let mut input = Cursor::new(b"trailing".to_vec());
        assert_eq!(take_line(&mut input).unwrap(), Some("trailing".to_string()));
    }
}
