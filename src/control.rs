//! Remote control via Unix socket
//!
//! Accepts line commands over a Unix socket to drive the screensaver as if
//! keys were pressed: trigger resets, switch joint modes, toggle multiple
//! spawning.

use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::config::JointMode;

const SOCKET_PATH: &str = "/tmp/pipesaver.sock";

/// Commands that can be sent over the socket
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a dissolve + reset; `fast` selects the short transition
    Reset { fast: bool },
    /// Switch the joint mode for the next spawned batches
    Joints(JointMode),
    /// Enable or disable multi-pipe batches
    Multiple(bool),
    ToggleFps,
    Quit,
}

/// Controller that listens for commands on a Unix socket
pub struct Controller {
    receiver: Receiver<Command>,
    _listener_thread: thread::JoinHandle<()>,
}

impl Controller {
    /// Create a new controller listening on the Unix socket
    pub fn new() -> Result<Self, String> {
        // Remove existing socket if present
        let _ = std::fs::remove_file(SOCKET_PATH);

        let listener = UnixListener::bind(SOCKET_PATH)
            .map_err(|e| format!("Failed to bind socket: {}", e))?;

        // Set non-blocking so we can check for new connections
        listener
            .set_nonblocking(true)
            .map_err(|e| format!("Failed to set non-blocking: {}", e))?;

        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::listener_loop(listener, sender);
        });

        Ok(Self {
            receiver,
            _listener_thread: handle,
        })
    }

    fn listener_loop(listener: UnixListener, sender: Sender<Command>) {
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    let sender = sender.clone();
                    thread::spawn(move || {
                        Self::handle_client(stream, sender);
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No connection ready, sleep briefly
                    thread::sleep(std::time::Duration::from_millis(50));
                }
                Err(_) => {
                    // Socket closed or error, exit loop
                    break;
                }
            }
        }
    }

    fn handle_client(stream: UnixStream, sender: Sender<Command>) {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            if let Some(cmd) = Self::parse_command(&line) {
                if sender.send(cmd).is_err() {
                    break;
                }
            }
        }
    }

    fn parse_command(line: &str) -> Option<Command> {
        let line = line.trim().to_lowercase();
        match line.as_str() {
            "reset" | "clear" => Some(Command::Reset { fast: false }),
            "reset fast" | "clear fast" => Some(Command::Reset { fast: true }),
            "multiple on" => Some(Command::Multiple(true)),
            "multiple off" => Some(Command::Multiple(false)),
            "f" | "fps" => Some(Command::ToggleFps),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => line
                .strip_prefix("joints ")
                .and_then(|rest| JointMode::parse(rest.trim()))
                .map(Command::Joints),
        }
    }

    /// Get any pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(cmd) = self.receiver.try_recv() {
            commands.push(cmd);
        }
        commands
    }

    /// Get the socket path
    pub fn socket_path() -> &'static str {
        SOCKET_PATH
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        // Clean up the socket file
        let _ = std::fs::remove_file(SOCKET_PATH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resets() {
        assert_eq!(
            Controller::parse_command("reset"),
            Some(Command::Reset { fast: false })
        );
        assert_eq!(
            Controller::parse_command("  RESET FAST "),
            Some(Command::Reset { fast: true })
        );
    }

    #[test]
    fn test_parse_joints() {
        assert_eq!(
            Controller::parse_command("joints ball"),
            Some(Command::Joints(JointMode::Ball))
        );
        assert_eq!(
            Controller::parse_command("joints cycle"),
            Some(Command::Joints(JointMode::Cycle))
        );
        // Unknown joint kinds are rejected at the boundary
        assert_eq!(Controller::parse_command("joints spline"), None);
    }

    #[test]
    fn test_parse_multiple_and_misc() {
        assert_eq!(
            Controller::parse_command("multiple off"),
            Some(Command::Multiple(false))
        );
        assert_eq!(Controller::parse_command("fps"), Some(Command::ToggleFps));
        assert_eq!(Controller::parse_command("quit"), Some(Command::Quit));
        assert_eq!(Controller::parse_command("bogus"), None);
    }
}
