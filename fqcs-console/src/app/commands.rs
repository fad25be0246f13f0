//! Operator command lines for the headless driver.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domains::ui::{ScreenInput, Slider, Trigger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Trigger(Trigger),
    OpenCamera(u32),
    /// `None` is a cancelled folder choice.
    LoadConfig(Option<PathBuf>),
    SaveConfig(Option<PathBuf>),
    Login { username: String, password: String },
    Input(ScreenInput),
    Status,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: invalid value {value:?}")]
    InvalidArgument { command: &'static str, value: String },
}

fn number<T: FromStr>(command: &'static str, value: &str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, CommandError> {
    value.ok_or(CommandError::MissingArgument { command, argument })
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head {
        "camera" => Command::OpenCamera(number("camera", required("camera", "index", words.next())?)?),
        "load" => Command::LoadConfig(words.next().map(PathBuf::from)),
        "save" => Command::SaveConfig(words.next().map(PathBuf::from)),
        "login" => {
            let username = required("login", "username", words.next())?.to_string();
            let password = required("login", "password", words.next())?.to_string();
            Command::Login { username, password }
        }
        "slider" => {
            let name = required("slider", "name", words.next())?;
            let slider = name.parse::<Slider>().map_err(|_| CommandError::InvalidArgument {
                command: "slider",
                value: name.to_string(),
            })?;
            let position = number("slider", required("slider", "position", words.next())?)?;
            Command::Input(ScreenInput::Slider(slider, position))
        }
        "resize" => {
            let width = number("resize", required("resize", "width", words.next())?)?;
            let height = number("resize", required("resize", "height", words.next())?)?;
            Command::Input(ScreenInput::Resize { width, height })
        }
        "status" => Command::Status,
        other => Command::Trigger(
            other
                .parse()
                .map_err(|_| CommandError::Unknown(other.to_string()))?,
        ),
    };
    Ok(Some(command))
}
