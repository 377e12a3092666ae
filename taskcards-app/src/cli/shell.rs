use crate::cli::commands::run_command;
use crate::cli::opts::{Command, ShellLine};

use anyhow::Result;
use clap::Parser;
use std::io::{stdin, stdout, Write};
use taskcards_core::{CollectionManager, KvStore};

#[derive(Debug)]
pub enum Parsed {
    Empty,
    Exit,
    Command(Command),
}

pub fn run(store: &dyn KvStore, mgr: &mut CollectionManager) -> Result<()> {
    println!("taskcards shell: `help` lists commands, `exit` quits");
    loop {
        let prompt = match mgr.active_collection() {
            Some(name) => format!("[{name}]> "),
            None => "> ".to_string(),
        };
        let Some(line) = read_input(&prompt)? else {
            println!();
            break;
        };
        match parse_line(&line) {
            Ok(Parsed::Empty) => continue,
            Ok(Parsed::Exit) => break,
            Ok(Parsed::Command(cmd)) => {
                if let Err(e) = run_command(store, mgr, cmd) {
                    println!("error: {e}");
                }
            }
            Err(msg) => println!("{msg}"),
        }
    }
    Ok(())
}

pub fn parse_line(line: &str) -> Result<Parsed, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Parsed::Empty);
    }
    if line == "exit" || line == "quit" {
        return Ok(Parsed::Exit);
    }
    let words = shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?;
    match ShellLine::try_parse_from(words) {
        Ok(ShellLine { cmd: Command::Shell }) => Err("already in a shell".to_string()),
        Ok(parsed) => Ok(Parsed::Command(parsed.cmd)),
        Err(e) => Err(e.render().to_string()),
    }
}

// None on end of input.
fn read_input(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    if stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::opts::{CardCmd, CollectionCmd};

    #[test]
    fn blank_and_exit_lines() {
        assert!(matches!(parse_line("   "), Ok(Parsed::Empty)));
        assert!(matches!(parse_line("exit"), Ok(Parsed::Exit)));
        assert!(matches!(parse_line(" quit \n"), Ok(Parsed::Exit)));
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let parsed = parse_line(r#"collection new "Sprint 1""#).unwrap();
        match parsed {
            Parsed::Command(Command::Collection(CollectionCmd::New { name })) => {
                assert_eq!(name, "Sprint 1")
            }
            other => panic!("unexpected {other:?}"),
        }

        let parsed = parse_line(r#"card add --description "write runbook" --tag a --tag b"#).unwrap();
        match parsed {
            Parsed::Command(Command::Card(CardCmd::Add(a))) => {
                assert_eq!(a.description, "write runbook");
                assert_eq!(a.tags, vec!["a", "b"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_nested_shell_and_bad_input() {
        assert!(parse_line("shell").is_err());
        assert!(parse_line(r#"collection new "open"#).is_err());
        assert!(parse_line("card frobnicate").is_err());
    }
}
