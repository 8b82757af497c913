/// Terminal input lines, translated into widget actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text (possibly empty) for the controller to validate and send.
    Submit(String),
    /// `/N`: pick option N (1-based) of the most recent option set.
    Choose(usize),
    /// `/history on|off`
    History(bool),
    /// `/privacy`: open the privacy popup.
    ShowPrivacy,
    /// `/privacy N`: select popup choice N and submit it.
    Privacy(usize),
    Help,
    Quit,
    /// A slash command we don't know.
    Unknown(String),
}

pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Submit(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let head = parts.next().unwrap_or("");
    let arg = parts.next();

    if let Ok(n) = head.parse::<usize>() {
        return Command::Choose(n);
    }

    match (head, arg) {
        ("history", Some("on")) => Command::History(true),
        ("history", Some("off")) => Command::History(false),
        ("privacy", None) => Command::ShowPrivacy,
        ("privacy", Some(n)) => n
            .parse()
            .map_or_else(|_| Command::Unknown(trimmed.to_string()), Command::Privacy),
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

pub const HELP: &str = "\
Type a message and press Enter to send it.
  /N             choose option N of the latest choices
  /history on    allow history questions (also asks the server)
  /history off   block history questions
  /privacy       show the privacy prompt
  /privacy N     answer the privacy prompt with choice N
  /quit          leave";
