use crate::manager::{ManagerError, WorkspaceManager};
use crate::model::{Board, Card, Workspace};
use crate::storage;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use std::io::{self, Write};
use std::path::PathBuf;

const MAX_PASSWORD_ATTEMPTS: u32 = 3;

pub fn create(data_dir: Option<PathBuf>, name: String) -> Result<()> {
    let mut manager = manager_at(data_dir)?;
    manager.create(&name)?;
    println!("Created workspace '{}'", name.trim());
    Ok(())
}

pub fn list(data_dir: Option<PathBuf>) -> Result<()> {
    let manager = manager_at(data_dir)?;
    if manager.registry().is_empty() {
        println!("No workspaces yet. Create one with `lockboard create <name>`.");
        return Ok(());
    }
    for (name, entry) in manager.registry().iter() {
        let lock = if manager.is_encrypted(name) {
            " [locked]"
        } else {
            ""
        };
        println!(
            "{}{}  (last edited {})",
            name,
            lock,
            entry.last_edited.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn show(data_dir: Option<PathBuf>, workspace: String, all: bool, password: Option<String>) -> Result<()> {
    view_workspace(data_dir, &workspace, password, |ws| {
        println!("Workspace: {}", ws.name);
        for (idx, board) in ws.boards().iter().enumerate() {
            let marker = if idx == ws.selected_index() { "*" } else { " " };
            println!("{} {}. {}", marker, idx + 1, board.name);
        }
        println!();
        if all {
            for board in ws.boards() {
                print_board(board);
            }
        } else {
            print_board(ws.selected_board());
        }
        Ok(())
    })
}

pub fn delete(data_dir: Option<PathBuf>, workspace: String) -> Result<()> {
    let mut manager = manager_at(data_dir)?;
    manager.delete(&workspace)?;
    println!("Deleted workspace '{workspace}'");
    Ok(())
}

pub fn rename(
    data_dir: Option<PathBuf>,
    workspace: String,
    new_name: String,
    password: Option<String>,
) -> Result<()> {
    let mut manager = manager_at(data_dir)?;
    with_password_retries(&workspace, password, |pw| {
        manager.rename(&workspace, &new_name, pw)
    })?;
    println!("Renamed workspace '{workspace}' to '{}'", new_name.trim());
    Ok(())
}

pub fn set_password(
    data_dir: Option<PathBuf>,
    workspace: String,
    new: Option<String>,
    clear: bool,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        if clear {
            ws.set_password(None);
            println!("Removed password from '{}'", ws.name);
            return Ok(());
        }
        let new = match new {
            Some(entered) => entered,
            None => match prompt_line("New password: ")? {
                Some(entered) => entered,
                None => bail!("cancelled"),
            },
        };
        if new.trim().is_empty() {
            bail!("password cannot be empty");
        }
        ws.set_password(Some(&new));
        println!("Password set for '{}'", ws.name);
        Ok(())
    })
}

pub fn add_board(
    data_dir: Option<PathBuf>,
    workspace: String,
    name: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.create_board(&name)?;
        println!("Added board '{}'", board.name);
        Ok(())
    })
}

pub fn select_board(
    data_dir: Option<PathBuf>,
    workspace: String,
    position: usize,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.select_board(to_index(position)?)?;
        println!("Selected board '{}'", ws.selected_board().name);
        Ok(())
    })
}

pub fn delete_board(
    data_dir: Option<PathBuf>,
    workspace: String,
    position: usize,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let index = to_index(position)?;
        let name = ws
            .boards()
            .get(index)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        ws.delete_board(index)?;
        println!("Deleted board '{name}'");
        Ok(())
    })
}

pub fn rename_board(
    data_dir: Option<PathBuf>,
    workspace: String,
    position: usize,
    new_name: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.board_mut(to_index(position)?)?;
        let old = board.name.clone();
        board.rename(&new_name)?;
        println!("Renamed board '{old}' to '{}'", board.name);
        Ok(())
    })
}

pub fn add_list(
    data_dir: Option<PathBuf>,
    workspace: String,
    name: String,
    description: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.selected_board_mut();
        let list = board.create_list(&name, &description)?;
        println!("Added list '{}'", list.name);
        Ok(())
    })
}

pub fn rename_list(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    new_name: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.selected_board_mut().rename_list(&list, &new_name)?;
        println!("Renamed list '{list}' to '{}'", new_name.trim());
        Ok(())
    })
}

pub fn delete_list(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.selected_board_mut().delete_list(&list)?;
        println!("Moved list '{list}' to the bin");
        Ok(())
    })
}

pub fn move_list(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    position: usize,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.selected_board_mut().move_list(&list, to_index(position)?)?;
        println!("Moved list '{list}' to position {position}");
        Ok(())
    })
}

pub fn set_done(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: Option<String>,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.selected_board_mut().set_completed_list(list.as_deref())?;
        match list {
            Some(name) => println!("Cards moved to '{name}' will now be marked done"),
            None => println!("Cleared the completed list"),
        }
        Ok(())
    })
}

pub fn add_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    name: String,
    description: String,
    deadline: Option<String>,
    priority: u8,
    password: Option<String>,
) -> Result<()> {
    let deadline = parse_deadline(deadline.as_deref())?;
    with_workspace(data_dir, &workspace, password, |ws| {
        let card = Card::new(&name, &description, deadline, priority)?;
        let target = ws
            .selected_board_mut()
            .get_list_mut(&list)
            .ok_or_else(|| anyhow!("list '{list}' not found"))?;
        target.add_card(card);
        println!("Added card '{}' to '{list}'", name.trim());
        Ok(())
    })
}

pub fn edit_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    card: String,
    name: Option<String>,
    description: Option<String>,
    deadline: Option<String>,
    clear_deadline: bool,
    priority: Option<u8>,
    done: bool,
    not_done: bool,
    password: Option<String>,
) -> Result<()> {
    let deadline = parse_deadline(deadline.as_deref())?;
    with_workspace(data_dir, &workspace, password, |ws| {
        let target = ws
            .selected_board_mut()
            .get_list_mut(&list)
            .ok_or_else(|| anyhow!("list '{list}' not found"))?;
        let found = target
            .find_card_mut(&card)
            .ok_or_else(|| anyhow!("card '{card}' not found in '{list}'"))?;
        if let Some(new_name) = name {
            found.rename(&new_name)?;
        }
        if let Some(text) = description {
            found.set_description(&text);
        }
        if clear_deadline {
            found.set_deadline(None);
        } else if deadline.is_some() {
            found.set_deadline(deadline);
        }
        if let Some(level) = priority {
            found.set_priority(level)?;
        }
        if done {
            found.set_completed(true);
        } else if not_done {
            found.set_completed(false);
        }
        println!("Updated card '{}'", found.name);
        Ok(())
    })
}

pub fn delete_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    card: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.selected_board_mut();
        let found = find_card(board, &list, &card)?;
        board.delete_card(&list, &found)?;
        println!("Moved card '{card}' to the bin");
        Ok(())
    })
}

pub fn move_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    card: String,
    from: String,
    to: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.selected_board_mut();
        let found = find_card(board, &from, &card)?;
        board.move_card(&found, &from, &to)?;
        println!("Moved card '{card}' from '{from}' to '{to}'");
        Ok(())
    })
}

pub fn reorder_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    card: String,
    position: usize,
    password: Option<String>,
) -> Result<()> {
    let index = to_index(position)?;
    with_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.selected_board_mut();
        let found = find_card(board, &list, &card)?;
        board
            .get_list_mut(&list)
            .ok_or_else(|| anyhow!("list '{list}' not found"))?
            .reorder_card(&found, index)?;
        println!("Moved card '{card}' to position {position} in '{list}'");
        Ok(())
    })
}

pub fn bin(data_dir: Option<PathBuf>, workspace: String, password: Option<String>) -> Result<()> {
    view_workspace(data_dir, &workspace, password, |ws| {
        let board = ws.selected_board();
        println!("Bin of board '{}'", board.name);
        if board.bin().is_empty() {
            println!("  (empty)");
            return Ok(());
        }
        for list in board.bin().lists() {
            println!("  list '{}' ({} cards)", list.name, list.card_count());
        }
        for archived in board.bin().cards() {
            println!(
                "  card '{}' (from '{}', deleted {})",
                archived.card.name,
                archived.source_list,
                archived.deleted_at.format("%Y-%m-%d %H:%M")
            );
        }
        Ok(())
    })
}

pub fn restore_list(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.selected_board_mut().restore_list(&list)?;
        println!("Restored list '{list}'");
        Ok(())
    })
}

pub fn restore_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    card: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let destination = ws.selected_board_mut().restore_card(&card)?;
        println!("Restored card '{card}' to '{destination}'");
        Ok(())
    })
}

pub fn purge_list(
    data_dir: Option<PathBuf>,
    workspace: String,
    list: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        let purged = ws.selected_board_mut().purge_list(&list)?;
        println!("Permanently deleted list '{list}' and {purged} archived cards");
        Ok(())
    })
}

pub fn purge_card(
    data_dir: Option<PathBuf>,
    workspace: String,
    card: String,
    password: Option<String>,
) -> Result<()> {
    with_workspace(data_dir, &workspace, password, |ws| {
        ws.selected_board_mut().purge_card(&card)?;
        println!("Permanently deleted card '{card}'");
        Ok(())
    })
}

fn manager_at(data_dir: Option<PathBuf>) -> Result<WorkspaceManager> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => storage::default_data_dir()?,
    };
    Ok(WorkspaceManager::new(&dir)?)
}

/// Opens, applies, saves, closes. Any error from `apply` abandons the
/// in-memory changes; nothing is written.
fn with_workspace<F>(
    data_dir: Option<PathBuf>,
    name: &str,
    password: Option<String>,
    apply: F,
) -> Result<()>
where
    F: FnOnce(&mut Workspace) -> Result<()>,
{
    let mut manager = manager_at(data_dir)?;
    open_prompting(&mut manager, name, password)?;
    let workspace = manager
        .current_mut()
        .ok_or_else(|| anyhow!("workspace '{name}' failed to open"))?;
    match apply(workspace) {
        Ok(()) => {
            manager.save()?;
            manager.close()?;
            Ok(())
        }
        Err(err) => {
            let _ = manager.close();
            Err(err)
        }
    }
}

/// Read-only variant of [`with_workspace`]: never saves, so viewing a
/// workspace does not bump its last-edited time.
fn view_workspace<F>(
    data_dir: Option<PathBuf>,
    name: &str,
    password: Option<String>,
    view: F,
) -> Result<()>
where
    F: FnOnce(&Workspace) -> Result<()>,
{
    let mut manager = manager_at(data_dir)?;
    open_prompting(&mut manager, name, password)?;
    let workspace = manager
        .current()
        .ok_or_else(|| anyhow!("workspace '{name}' failed to open"))?;
    let result = view(workspace);
    let _ = manager.close();
    result
}

fn open_prompting(
    manager: &mut WorkspaceManager,
    name: &str,
    password: Option<String>,
) -> Result<()> {
    with_password_retries(name, password, |pw| manager.open(name, pw).map(|_| ()))
}

/// Runs `op`, prompting on stdin when the workspace turns out to be
/// encrypted and re-prompting on a wrong password. Typing `cancel` aborts.
fn with_password_retries<T>(
    name: &str,
    password: Option<String>,
    op: impl FnMut(Option<&str>) -> Result<T, ManagerError>,
) -> Result<T> {
    let prompt = format!("Password for '{name}' (or 'cancel'): ");
    retry_password(password, op, || prompt_line(&prompt))
}

/// Retry loop behind [`with_password_retries`], separated from the
/// terminal so it can be driven by a scripted prompt in tests. Every
/// prompted entry counts against the attempt budget, empty entries
/// included; closed stdin (`None` from the prompt) aborts like an
/// explicit cancel.
fn retry_password<T>(
    mut password: Option<String>,
    mut op: impl FnMut(Option<&str>) -> Result<T, ManagerError>,
    mut prompt: impl FnMut() -> Result<Option<String>>,
) -> Result<T> {
    let mut attempts = 0u32;
    loop {
        match op(password.as_deref()) {
            Ok(value) => return Ok(value),
            Err(ManagerError::PasswordRequired(_)) => {}
            Err(ManagerError::BadPassword) => eprintln!("Incorrect password."),
            Err(err) => return Err(err.into()),
        }
        if attempts >= MAX_PASSWORD_ATTEMPTS {
            bail!("too many incorrect password attempts");
        }
        attempts += 1;
        let entered = match prompt()? {
            Some(entered) => entered,
            None => bail!("cancelled"),
        };
        if entered.eq_ignore_ascii_case("cancel") {
            bail!("cancelled");
        }
        password = Some(entered);
    }
}

/// Reads one trimmed line from stdin; `None` on end of input.
fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush().context("flushing prompt")?;
    let mut line = String::new();
    let read = io::stdin()
        .read_line(&mut line)
        .context("reading from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// User-facing positions start at 1.
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow!("positions start at 1"))
}

fn find_card(board: &Board, list: &str, card: &str) -> Result<Card> {
    board
        .get_list(list)
        .ok_or_else(|| anyhow!("list '{list}' not found"))?
        .find_card(card)
        .cloned()
        .ok_or_else(|| anyhow!("card '{card}' not found in '{list}'"))
}

fn print_board(board: &Board) {
    println!("Board: {}", board.name);
    if let Some(done) = board.completed_list() {
        println!("(completed list: {done})");
    }
    if board.lists().is_empty() {
        println!("  (no lists)");
    }
    for list in board.lists() {
        if list.description.is_empty() {
            println!("  {}", list.name);
        } else {
            println!("  {} - {}", list.name, list.description);
        }
        if list.cards().is_empty() {
            println!("    (empty)");
        }
        for card in list.cards() {
            print_card(card);
        }
    }
    if !board.bin().is_empty() {
        println!(
            "  bin: {} lists, {} cards",
            board.bin().lists().len(),
            board.bin().cards().len()
        );
    }
    println!();
}

fn print_card(card: &Card) {
    let check = if card.completed { "x" } else { " " };
    let mut line = format!("    [{check}] {}", card.name);
    if card.priority > 0 {
        line.push_str(&format!(" (p{})", card.priority));
    }
    if let Some(deadline) = card.deadline {
        line.push_str(&format!(" due {}", deadline.format("%Y-%m-%d")));
        if card.is_overdue() && !card.completed {
            line.push_str(" OVERDUE");
        }
    }
    println!("{line}");
    if !card.description.is_empty() {
        println!("        {}", card.description);
    }
}

fn parse_deadline(input: Option<&str>) -> Result<Option<NaiveDate>> {
    let raw = match input {
        Some(raw) => raw.trim(),
        None => return Ok(None),
    };
    if raw.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date format (use YYYY-MM-DD): {raw}"))?;
    Ok(Some(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mirrors how the manager reacts to passwords on an encrypted
    // workspace: absent or blank asks for one, wrong ones are rejected.
    fn password_gate(secret: &str) -> impl FnMut(Option<&str>) -> Result<(), ManagerError> + '_ {
        move |pw| match pw.map(str::trim).filter(|p| !p.is_empty()) {
            None => Err(ManagerError::PasswordRequired("Vault".to_string())),
            Some(p) if p == secret => Ok(()),
            Some(_) => Err(ManagerError::BadPassword),
        }
    }

    #[test]
    fn empty_entries_consume_password_attempts() {
        let mut prompts = 0u32;
        let result = retry_password(None, password_gate("pw"), || {
            prompts += 1;
            Ok(Some(String::new()))
        });
        assert_eq!(
            result.unwrap_err().to_string(),
            "too many incorrect password attempts"
        );
        assert_eq!(prompts, MAX_PASSWORD_ATTEMPTS);
    }

    #[test]
    fn closed_stdin_aborts_like_cancel() {
        let mut prompts = 0u32;
        let result = retry_password(None, password_gate("pw"), || {
            prompts += 1;
            Ok(None)
        });
        assert_eq!(result.unwrap_err().to_string(), "cancelled");
        assert_eq!(prompts, 1);
    }

    #[test]
    fn cancel_entry_aborts() {
        let result = retry_password(None, password_gate("pw"), || Ok(Some("CANCEL".into())));
        assert_eq!(result.unwrap_err().to_string(), "cancelled");
    }

    #[test]
    fn wrong_entries_exhaust_the_budget() {
        let result = retry_password(Some("nope".into()), password_gate("pw"), || {
            Ok(Some("still wrong".into()))
        });
        assert_eq!(
            result.unwrap_err().to_string(),
            "too many incorrect password attempts"
        );
    }

    #[test]
    fn correct_entry_after_failures_succeeds() {
        let mut entries = ["wrong", "", "pw"].into_iter();
        let result = retry_password(None, password_gate("pw"), || {
            Ok(entries.next().map(str::to_string))
        });
        assert!(result.is_ok());
    }
}
