//! Prefix command parsing

/// A parsed chat command, before any asset resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!btc`, `!ethereum`, ... (the token may still turn out to be unknown)
    Price(String),
    /// `!crypto` / `!all`
    Summary,
    /// `!chart <asset> [days]`, token kept as typed for error replies
    Chart { token: Option<String>, days: Option<u32> },
    /// `!help`
    Help,
}

/// Parse message content; `None` when the message is not for us
pub fn parse(content: &str, prefix: &str) -> Option<Command> {
    let rest = content.trim_start().strip_prefix(prefix)?;

    let mut args = rest.split_whitespace();
    let command = args.next()?.to_lowercase();

    let parsed = match command.as_str() {
        "crypto" | "all" => Command::Summary,
        "help" => Command::Help,
        "chart" => Command::Chart {
            token: args.next().map(|t| t.to_string()),
            days: args.next().and_then(|d| d.parse::<u32>().ok()),
        },
        _ => Command::Price(command),
    };

    Some(parsed)
}
