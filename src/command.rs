//! Command types and parsing for the console prompt

use crate::mail::types::MessageId;

/// Help information for a command
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub name: &'static str,
    pub description: &'static str,
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    List,
    Inbox,
    Search(String),
    Filter(String),
    Refresh,
    Archive(Vec<MessageId>),
    Trash(Vec<MessageId>),
    Label { label: String, ids: Vec<MessageId> },
    Unlabel { label: String, ids: Vec<MessageId> },
    Move { label: String, ids: Vec<MessageId> },
    Read(Vec<MessageId>),
    Unread(Vec<MessageId>),
    ShowLabels(MessageId),
    CloseLabels,
    Undo,
    Help,
    Quit,
}

/// Parse a command string into a ParsedCommand
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let trimmed = input.trim();
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match name {
        "ls" | "list" => Some(ParsedCommand::List),
        "inbox" => Some(ParsedCommand::Inbox),
        "search" | "/" if !rest.is_empty() => Some(ParsedCommand::Search(rest.to_string())),
        "filter" | "f" if !rest.is_empty() => Some(ParsedCommand::Filter(rest.to_string())),
        "refresh" | "r" => Some(ParsedCommand::Refresh),
        "archive" | "a" => ids(&args).map(ParsedCommand::Archive),
        "trash" | "d" => ids(&args).map(ParsedCommand::Trash),
        "label" => label_and_ids(&args).map(|(label, ids)| ParsedCommand::Label { label, ids }),
        "unlabel" => {
            label_and_ids(&args).map(|(label, ids)| ParsedCommand::Unlabel { label, ids })
        }
        "move" | "mv" => {
            label_and_ids(&args).map(|(label, ids)| ParsedCommand::Move { label, ids })
        }
        "read" => ids(&args).map(ParsedCommand::Read),
        "unread" => ids(&args).map(ParsedCommand::Unread),
        "labels" => match args.as_slice() {
            [id] => Some(ParsedCommand::ShowLabels(id.to_string())),
            [] => Some(ParsedCommand::CloseLabels),
            _ => None,
        },
        "u" | "undo" => Some(ParsedCommand::Undo),
        "help" | "h" | "?" => Some(ParsedCommand::Help),
        "q" | "quit" => Some(ParsedCommand::Quit),
        _ => None,
    }
}

fn ids(args: &[&str]) -> Option<Vec<MessageId>> {
    if args.is_empty() {
        return None;
    }
    Some(args.iter().map(|s| s.to_string()).collect())
}

fn label_and_ids(args: &[&str]) -> Option<(String, Vec<MessageId>)> {
    let (label, rest) = args.split_first()?;
    Some((label.to_string(), ids(rest)?))
}

/// Get all available commands for help display
pub fn available_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: "archive <id>...",
            description: "Remove messages from the inbox",
        },
        CommandHelp {
            name: "filter <text>",
            description: "Filter the current list locally",
        },
        CommandHelp {
            name: "help",
            description: "Show this help message",
        },
        CommandHelp {
            name: "inbox",
            description: "Show the inbox",
        },
        CommandHelp {
            name: "label <label> <id>...",
            description: "Apply a label (name or ID)",
        },
        CommandHelp {
            name: "labels [id]",
            description: "Show a message's labels (no ID closes the panel)",
        },
        CommandHelp {
            name: "ls",
            description: "Print the current list",
        },
        CommandHelp {
            name: "move <label> <id>...",
            description: "Apply a label and leave the inbox",
        },
        CommandHelp {
            name: "quit",
            description: "Exit the application",
        },
        CommandHelp {
            name: "read <id>...",
            description: "Mark messages read",
        },
        CommandHelp {
            name: "refresh",
            description: "Reload the current view from the server",
        },
        CommandHelp {
            name: "search <query>",
            description: "Search all mail",
        },
        CommandHelp {
            name: "trash <id>...",
            description: "Move messages to trash",
        },
        CommandHelp {
            name: "undo",
            description: "Undo the last action",
        },
        CommandHelp {
            name: "unlabel <label> <id>...",
            description: "Remove a label",
        },
        CommandHelp {
            name: "unread <id>...",
            description: "Mark messages unread",
        },
    ]
}
