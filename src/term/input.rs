use futures::SinkExt;
use futures::channel::mpsc::Sender;
use log::{info, warn};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::device::types::{CoreEvent, UserCommand};

pub const HELP: &str = "\
Commands:
  s, scan          start or stop scanning
  c N, connect N   connect to the device at position N
  d, disconnect    close the current connection
  l, list          print all devices found so far
  h, help          print this help
  q, quit          exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Core(UserCommand),
    Help,
    Quit,
    Nothing,
}

pub fn parse_line(line: &str) -> Result<InputAction, String> {
    let mut words = line.split_whitespace();

    let Some(command) = words.next() else {
        return Ok(InputAction::Nothing);
    };

    let action = match command.to_ascii_lowercase().as_str() {
        "s" | "scan" => InputAction::Core(UserCommand::ToggleScan),
        "d" | "disconnect" => InputAction::Core(UserCommand::Disconnect),
        "l" | "list" => InputAction::Core(UserCommand::List),
        "h" | "help" | "?" => InputAction::Help,
        "q" | "quit" | "exit" => InputAction::Quit,
        "c" | "connect" => {
            let index = words.next().ok_or_else(|| "connect needs a device position".to_string())?;
            let index = index.parse::<usize>().map_err(|_| format!("not a device position: {}", index))?;
            InputAction::Core(UserCommand::Select(index))
        },
        // a bare number is a tap on that list position
        other => match other.parse::<usize>() {
            Ok(index) => InputAction::Core(UserCommand::Select(index)),
            Err(_) => return Err(format!("unknown command: {}", other)),
        },
    };

    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    Ok(action)
}

/// Reads commands from stdin until "quit", end of input or `cancel`. Quitting cancels `cancel`.
pub fn input_task(cancel: CancellationToken, mut events: Sender<CoreEvent>) -> JoinHandle<()> {
    spawn(async move {
        let mut lines = BufReader::new(stdin()).lines();

        'mainloop: loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                line = lines.next_line() => match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("End of input");
                        cancel.cancel();
                        break 'mainloop;
                    },
                    Err(err) => {
                        warn!("Failed to read from stdin: {:?}", err);
                        cancel.cancel();
                        break 'mainloop;
                    },
                },
            };

            match parse_line(&line) {
                Ok(InputAction::Core(command)) => {
                    if events.send(CoreEvent::Command(command)).await.is_err() {
                        break 'mainloop;
                    }
                },
                Ok(InputAction::Help) => println!("{}", HELP),
                Ok(InputAction::Quit) => {
                    cancel.cancel();
                    break 'mainloop;
                },
                Ok(InputAction::Nothing) => {},
                Err(message) => println!("{}\n{}", message, HELP),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("s"), Ok(InputAction::Core(UserCommand::ToggleScan)));
        assert_eq!(parse_line(" Scan "), Ok(InputAction::Core(UserCommand::ToggleScan)));
        assert_eq!(parse_line("connect 3"), Ok(InputAction::Core(UserCommand::Select(3))));
        assert_eq!(parse_line("2"), Ok(InputAction::Core(UserCommand::Select(2))));
        assert_eq!(parse_line("d"), Ok(InputAction::Core(UserCommand::Disconnect)));
        assert_eq!(parse_line("list"), Ok(InputAction::Core(UserCommand::List)));
        assert_eq!(parse_line("q"), Ok(InputAction::Quit));
        assert_eq!(parse_line(""), Ok(InputAction::Nothing));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_line("c").is_err());
        assert!(parse_line("c -1").is_err());
        assert!(parse_line("scan now").is_err());
        assert!(parse_line("bogus").is_err());
    }
}
