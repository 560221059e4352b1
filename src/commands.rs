// src/commands.rs
use crate::error::AppError;
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  load                    reload favourites
  add [symbol]            add a favourite (uses the symbol input when omitted)
  remove <symbol|row>     remove a favourite
  user [id]               set the user id (blank means 1) and reload
  show                    print the panel
  wait                    wait for pending prices
  help                    this text
  quit                    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load,
    Add(Option<String>),
    Remove(String),
    User(String),
    Show,
    Wait,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        match word.to_lowercase().as_str() {
            "load" | "reload" => Ok(Command::Load),
            "add" if rest.is_empty() => Ok(Command::Add(None)),
            "add" => Ok(Command::Add(Some(rest.to_string()))),
            "remove" | "rm" if rest.is_empty() => Err(AppError::Validation(
                "remove needs a symbol or row number".to_string(),
            )),
            "remove" | "rm" => Ok(Command::Remove(rest.to_string())),
            "user" => Ok(Command::User(rest.to_string())),
            "show" | "ls" => Ok(Command::Show),
            "wait" => Ok(Command::Wait),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(AppError::Validation(format!("unknown command '{}'", other))),
        }
    }
}
