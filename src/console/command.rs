use std::str::FromStr;

use crate::{
    error::CommandError,
    models::medicine::{DoseTime, Frequency, MedicineId},
    storage::NewMedicine,
};

pub const HELP: &[&str] = &[
    "add <name>|<dosage>|<HH:MM>[|daily|weekly][|notes]   add a medicine",
    "delete <id>                                          remove a medicine",
    "taken [id]                                           mark a dose as taken",
    "snooze [id]                                          remind again in a few minutes",
    "list                                                 medicines by time of day",
    "next                                                 countdown to the next dose",
    "history                                              doses taken today",
    "quit                                                 stop reminders and exit",
];

/// One line typed by the user. `taken` and `snooze` without an id act on the reminder
/// currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Taken(Option<MedicineId>),
    Snooze(Option<MedicineId>),
    Add(NewMedicine),
    Delete(MedicineId),
    List,
    Next,
    History,
    Help,
    Quit,
}

impl FromStr for HostCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));
        let optional_id = || (!rest.is_empty()).then(|| rest.to_owned());

        match verb.to_lowercase().as_str() {
            "taken" | "take" => Ok(Self::Taken(optional_id())),
            "snooze" => Ok(Self::Snooze(optional_id())),
            "add" => parse_new_medicine(rest).map(Self::Add),
            "delete" | "rm" => optional_id()
                .map(Self::Delete)
                .ok_or(CommandError::MissingArgument("medicine id")),
            "list" | "ls" => Ok(Self::List),
            "next" => Ok(Self::Next),
            "history" => Ok(Self::History),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(line.to_owned())),
        }
    }
}

fn parse_new_medicine(rest: &str) -> Result<NewMedicine, CommandError> {
    let mut parts = rest.split('|').map(str::trim);
    let mut next_part = || parts.next().filter(|part| !part.is_empty());

    let name = next_part().ok_or(CommandError::MissingArgument("medicine name"))?;
    let dosage = next_part().ok_or(CommandError::MissingArgument("dosage"))?;
    let time = next_part()
        .ok_or(CommandError::MissingArgument("time (HH:MM)"))?
        .parse::<DoseTime>()?;
    let frequency = next_part()
        .map(str::parse::<Frequency>)
        .transpose()?
        .unwrap_or(Frequency::Daily);
    let notes = next_part().map(str::to_owned);

    Ok(NewMedicine {
        name: name.to_owned(),
        dosage: dosage.to_owned(),
        time,
        frequency,
        notes,
    })
}
