use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lockboard", version, about = "Password-protected kanban workspaces")]
pub struct Cli {
    /// Override the data directory (defaults to the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new workspace with one empty board
    Create {
        /// Name of the workspace
        name: String,
    },
    /// List all known workspaces
    List,
    /// Show the boards and lists of a workspace
    Show {
        workspace: String,
        /// Show every board, not just the selected one
        #[arg(long)]
        all: bool,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Delete a workspace and everything in it
    Delete {
        workspace: String,
    },
    /// Rename a workspace
    Rename {
        workspace: String,
        new_name: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Set, change, or remove a workspace password
    SetPassword {
        workspace: String,
        /// New password (prompted for if omitted)
        #[arg(long)]
        new: Option<String>,
        /// Remove the password instead of setting one
        #[arg(long, conflicts_with = "new")]
        clear: bool,
        /// Current workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Add a board to a workspace
    AddBoard {
        workspace: String,
        name: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Select the board that list and card commands act on
    SelectBoard {
        workspace: String,
        /// Board position, starting at 1
        position: usize,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Delete a board (a workspace always keeps at least one)
    DeleteBoard {
        workspace: String,
        /// Board position, starting at 1
        position: usize,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Rename a board
    RenameBoard {
        workspace: String,
        /// Board position, starting at 1
        position: usize,
        new_name: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Add a list to the selected board
    AddList {
        workspace: String,
        name: String,
        /// Optional list description
        #[arg(long, default_value = "")]
        description: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Rename a list on the selected board
    RenameList {
        workspace: String,
        list: String,
        new_name: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Move a list and its cards to the bin
    DeleteList {
        workspace: String,
        list: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Move a list to a new position on the selected board
    MoveList {
        workspace: String,
        list: String,
        /// Target position, starting at 1
        position: usize,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Designate the completed list of the selected board (omit to clear)
    SetDone {
        workspace: String,
        /// List to designate; cards moved here are marked done
        list: Option<String>,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Add a card to a list on the selected board
    AddCard {
        workspace: String,
        list: String,
        name: String,
        /// Optional card description
        #[arg(long, default_value = "")]
        description: String,
        /// Due date in YYYY-MM-DD format
        #[arg(long)]
        deadline: Option<String>,
        /// Priority from 0 (none) to 5
        #[arg(long, default_value_t = 0)]
        priority: u8,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Edit a card in place
    EditCard {
        workspace: String,
        list: String,
        card: String,
        /// New card name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New due date in YYYY-MM-DD format
        #[arg(long)]
        deadline: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
        /// New priority from 0 (none) to 5
        #[arg(long)]
        priority: Option<u8>,
        /// Mark the card done
        #[arg(long)]
        done: bool,
        /// Mark the card not done
        #[arg(long, conflicts_with = "done")]
        not_done: bool,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Move a card to the bin
    DeleteCard {
        workspace: String,
        list: String,
        card: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Move a card from one list to another
    MoveCard {
        workspace: String,
        card: String,
        /// Source list
        from: String,
        /// Destination list
        to: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Move a card to a new position within its list
    ReorderCard {
        workspace: String,
        list: String,
        card: String,
        /// Target position, starting at 1
        position: usize,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Show the bin of the selected board
    Bin {
        workspace: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Restore a binned list to the selected board
    RestoreList {
        workspace: String,
        list: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Restore a binned card to the list it was deleted from
    RestoreCard {
        workspace: String,
        card: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Permanently delete a binned list and its archived cards
    PurgeList {
        workspace: String,
        list: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Permanently delete a binned card
    PurgeCard {
        workspace: String,
        card: String,
        /// Workspace password (prompted for if needed)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
}
