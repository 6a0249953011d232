//! Line commands of the interactive session. Every accepted filter command
//! re-renders the full report.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use crate::data::filter::{parse_availability, parse_ratings};
use crate::data::model::Availability;
use crate::render;
use crate::session::Session;

pub const HELP: &str = "\
Commands:
  price MIN MAX            keep prices in [MIN, MAX]
  ratings 1,2,...          keep these ratings
  availability in|out|all  keep these availability values
  title TEXT               keep titles containing TEXT (no TEXT clears it)
  top on|off               keep only ratings 4 and 5
  reset                    select everything again
  show                     print the full report
  tests                    print the hypothesis tests only
  export PATH              write the filtered table (.csv, .json, .parquet)
  help                     this text
  quit                     leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Price(f64, f64),
    Ratings(BTreeSet<u8>),
    Availability(BTreeSet<Availability>),
    Title(Option<String>),
    TopRated(bool),
    Reset,
    Show,
    Tests,
    Export(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "price" => {
                let bounds: Vec<&str> = rest.split_whitespace().collect();
                let &[min, max] = bounds.as_slice() else {
                    return Err("usage: price MIN MAX".into());
                };
                let parse = |s: &str| s.parse::<f64>().map_err(|_| format!("'{s}' is not a price"));
                Ok(Command::Price(parse(min)?, parse(max)?))
            }
            "ratings" => parse_ratings(rest).map(Command::Ratings),
            "availability" => parse_availability(rest).map(Command::Availability),
            "title" => Ok(Command::Title(Some(rest.to_string()).filter(|t| !t.is_empty()))),
            "top" => match rest.to_ascii_lowercase().as_str() {
                "on" => Ok(Command::TopRated(true)),
                "off" => Ok(Command::TopRated(false)),
                _ => Err("usage: top on|off".into()),
            },
            "reset" => Ok(Command::Reset),
            "show" => Ok(Command::Show),
            "tests" => Ok(Command::Tests),
            "export" if !rest.is_empty() => Ok(Command::Export(PathBuf::from(rest))),
            "export" => Err("usage: export PATH".into()),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

/// What the front-end should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Print(String),
    Quit,
}

/// Run one command against the session.
pub fn execute(session: &mut Session, command: Command) -> Reply {
    let edited = match command {
        Command::Price(min, max) => session.update_criteria(|c| {
            c.price_min = min;
            c.price_max = max;
        }),
        Command::Ratings(ratings) => session.update_criteria(|c| c.ratings = ratings),
        Command::Availability(set) => session.update_criteria(|c| c.availability = set),
        Command::Title(title) => session.update_criteria(|c| c.title_substring = title),
        Command::TopRated(on) => session.update_criteria(|c| c.top_rated_only = on),
        Command::Reset => {
            session.reset();
            Ok(())
        }
        Command::Show => Ok(()),
        Command::Tests => return Reply::Print(render::tests_table(session.report()).to_string()),
        Command::Export(path) => {
            return match session.export(&path) {
                Ok(()) => Reply::Print(session.status_message.clone().unwrap_or_default()),
                Err(e) => Reply::Print(format!("export failed: {e:#}")),
            };
        }
        Command::Help => return Reply::Print(HELP.to_string()),
        Command::Quit => return Reply::Quit,
    };

    match edited {
        Ok(()) => Reply::Print(render::report_text(session.report(), session.criteria())),
        Err(e) => Reply::Print(format!("rejected: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::data::model::{Record, Table};

    fn session() -> Session {
        Session::new(
            Table::from_records(vec![
                Record::new("A Light in the Attic", 51.77, 3, Availability::InStock),
                Record::new("Tipping the Velvet", 53.74, 1, Availability::InStock),
                Record::new("Sharp Objects", 47.82, 4, Availability::OutOfStock),
                Record::new("Sapiens", 54.23, 5, Availability::InStock),
            ]),
            AnalysisConfig::default(),
        )
    }

    fn cmd(line: &str) -> Result<Command, String> {
        line.parse()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(cmd("price 10 50"), Ok(Command::Price(10.0, 50.0)));
        assert_eq!(
            cmd("ratings 4,5"),
            Ok(Command::Ratings(BTreeSet::from([4, 5])))
        );
        assert_eq!(
            cmd("availability in"),
            Ok(Command::Availability(BTreeSet::from([Availability::InStock])))
        );
        assert_eq!(cmd("title  the velvet "), Ok(Command::Title(Some("the velvet".into()))));
        assert_eq!(cmd("title"), Ok(Command::Title(None)));
        assert_eq!(cmd("TOP on"), Ok(Command::TopRated(true)));
        assert_eq!(cmd("export out/top.csv"), Ok(Command::Export("out/top.csv".into())));
        assert!(cmd("price 10").is_err());
        assert!(cmd("export").is_err());
        assert!(cmd("plot").is_err());
    }

    #[test]
    fn filter_commands_rerender() {
        let mut s = session();
        let Reply::Print(text) = execute(&mut s, Command::TopRated(true)) else {
            panic!("expected output");
        };
        assert!(text.starts_with("2 records"));
        assert_eq!(s.report().count, 2);
    }

    #[test]
    fn rejected_command_keeps_report() {
        let mut s = session();
        execute(&mut s, Command::Ratings(BTreeSet::from([3, 4, 5])));
        let reply = execute(&mut s, Command::Price(60.0, 10.0));
        assert!(matches!(reply, Reply::Print(ref t) if t.starts_with("rejected")));
        assert_eq!(s.report().count, 3);

        execute(&mut s, Command::Reset);
        assert_eq!(s.report().count, 4);
        assert_eq!(execute(&mut s, Command::Quit), Reply::Quit);
    }
}
