/// Browse commands, autocomplete and parsing
use crate::api::query::{Gender, Status};
use crate::cache::CacheNamespace;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "next",
    aliases: &["n"],
    usage: "next",
    description: "Next page",
  },
  Command {
    name: "prev",
    aliases: &["p", "previous"],
    usage: "prev",
    description: "Previous page",
  },
  Command {
    name: "page",
    aliases: &["g", "goto"],
    usage: "page N",
    description: "Jump to page N",
  },
  Command {
    name: "search",
    aliases: &["s", "name", "find"],
    usage: "search [TEXT]",
    description: "Filter by name (empty clears)",
  },
  Command {
    name: "status",
    aliases: &["st"],
    usage: "status [alive|dead|unknown]",
    description: "Filter by status (empty clears)",
  },
  Command {
    name: "gender",
    aliases: &["ge"],
    usage: "gender [female|male|genderless|unknown]",
    description: "Filter by gender (empty clears)",
  },
  Command {
    name: "reset",
    aliases: &["r"],
    usage: "reset",
    description: "Clear all filters",
  },
  Command {
    name: "show",
    aliases: &["d", "detail", "character"],
    usage: "show ID",
    description: "Character details and episodes",
  },
  Command {
    name: "retry",
    aliases: &["reload", "refresh"],
    usage: "retry",
    description: "Load the current view again",
  },
  Command {
    name: "stats",
    aliases: &["cache"],
    usage: "stats",
    description: "Cache statistics",
  },
  Command {
    name: "clear",
    aliases: &["c"],
    usage: "clear [listing|detail|episodes]",
    description: "Clear the cache",
  },
  Command {
    name: "online",
    aliases: &["net", "connection"],
    usage: "online",
    description: "Connection status",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "List commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit rickdex",
  },
];

/// A parsed browse command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
  Next,
  Prev,
  Page(u32),
  Search(String),
  Status(Option<Status>),
  Gender(Option<Gender>),
  Reset,
  Show(u64),
  Retry,
  Stats,
  Clear(Option<CacheNamespace>),
  Online,
  Help,
  Quit,
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if let Some(priority) = match_priority(cmd, &input_lower) {
      matches.push((cmd, priority));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Resolve a typed command word. Exact and prefix matches count; fuzzy
/// matches are only suggestions. A word that matches several commands
/// equally well is rejected rather than guessed.
fn resolve(word: &str) -> Result<&'static Command, String> {
  let lower = word.to_lowercase();
  let matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &lower).map(|p| (cmd, p)))
    .filter(|(_, p)| *p <= 3)
    .collect();

  let Some(best) = matches.iter().map(|(_, p)| *p).min() else {
    return Err(match get_suggestions(&lower).first() {
      Some(s) => format!("Unknown command '{}'. Did you mean '{}'?", word, s.name),
      None => format!("Unknown command '{}'. Type 'help' for a list.", word),
    });
  };

  let tied: Vec<&'static Command> = matches
    .into_iter()
    .filter(|(_, p)| *p == best)
    .map(|(cmd, _)| cmd)
    .collect();
  match tied.as_slice() {
    [cmd] => Ok(*cmd),
    _ => {
      let names: Vec<&str> = tied.iter().map(|cmd| cmd.name).collect();
      Err(format!("Ambiguous command '{}': {}", word, names.join(", ")))
    }
  }
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<BrowseCommand, String> {
  let line = line.trim();
  let (word, rest) = match line.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (line, ""),
  };
  if word.is_empty() {
    return Err("Type a command, or 'help'".to_string());
  }

  let cmd = resolve(word)?;

  let command = match cmd.name {
    "next" => BrowseCommand::Next,
    "prev" => BrowseCommand::Prev,
    "page" => BrowseCommand::Page(number(cmd, rest)?),
    "search" => BrowseCommand::Search(rest.to_string()),
    "status" => BrowseCommand::Status(optional(rest)?),
    "gender" => BrowseCommand::Gender(optional(rest)?),
    "reset" => BrowseCommand::Reset,
    "show" => BrowseCommand::Show(number(cmd, rest)?),
    "retry" => BrowseCommand::Retry,
    "stats" => BrowseCommand::Stats,
    "clear" => BrowseCommand::Clear(optional(rest)?),
    "online" => BrowseCommand::Online,
    "help" => BrowseCommand::Help,
    "quit" => BrowseCommand::Quit,
    other => return Err(format!("Command '{}' is not available here", other)),
  };
  Ok(command)
}

fn number<T: std::str::FromStr>(cmd: &Command, arg: &str) -> Result<T, String> {
  arg
    .parse()
    .map_err(|_| format!("Usage: {}", cmd.usage))
}

fn optional<T>(arg: &str) -> Result<Option<T>, String>
where
  T: std::str::FromStr,
  T::Err: ToString,
{
  if arg.is_empty() {
    return Ok(None);
  }
  arg.parse().map(Some).map_err(|e: T::Err| e.to_string())
}
