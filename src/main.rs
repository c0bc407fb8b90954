mod cli;
mod commands;
mod crypto;
mod manager;
mod model;
mod storage;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let data_dir = args.data_dir;
    match args.command {
        cli::Command::Create { name } => commands::create(data_dir, name),
        cli::Command::List => commands::list(data_dir),
        cli::Command::Show {
            workspace,
            all,
            password,
        } => commands::show(data_dir, workspace, all, password),
        cli::Command::Delete { workspace } => commands::delete(data_dir, workspace),
        cli::Command::Rename {
            workspace,
            new_name,
            password,
        } => commands::rename(data_dir, workspace, new_name, password),
        cli::Command::SetPassword {
            workspace,
            new,
            clear,
            password,
        } => commands::set_password(data_dir, workspace, new, clear, password),
        cli::Command::AddBoard {
            workspace,
            name,
            password,
        } => commands::add_board(data_dir, workspace, name, password),
        cli::Command::SelectBoard {
            workspace,
            position,
            password,
        } => commands::select_board(data_dir, workspace, position, password),
        cli::Command::DeleteBoard {
            workspace,
            position,
            password,
        } => commands::delete_board(data_dir, workspace, position, password),
        cli::Command::RenameBoard {
            workspace,
            position,
            new_name,
            password,
        } => commands::rename_board(data_dir, workspace, position, new_name, password),
        cli::Command::AddList {
            workspace,
            name,
            description,
            password,
        } => commands::add_list(data_dir, workspace, name, description, password),
        cli::Command::RenameList {
            workspace,
            list,
            new_name,
            password,
        } => commands::rename_list(data_dir, workspace, list, new_name, password),
        cli::Command::DeleteList {
            workspace,
            list,
            password,
        } => commands::delete_list(data_dir, workspace, list, password),
        cli::Command::MoveList {
            workspace,
            list,
            position,
            password,
        } => commands::move_list(data_dir, workspace, list, position, password),
        cli::Command::SetDone {
            workspace,
            list,
            password,
        } => commands::set_done(data_dir, workspace, list, password),
        cli::Command::AddCard {
            workspace,
            list,
            name,
            description,
            deadline,
            priority,
            password,
        } => commands::add_card(
            data_dir, workspace, list, name, description, deadline, priority, password,
        ),
        cli::Command::EditCard {
            workspace,
            list,
            card,
            name,
            description,
            deadline,
            clear_deadline,
            priority,
            done,
            not_done,
            password,
        } => commands::edit_card(
            data_dir,
            workspace,
            list,
            card,
            name,
            description,
            deadline,
            clear_deadline,
            priority,
            done,
            not_done,
            password,
        ),
        cli::Command::DeleteCard {
            workspace,
            list,
            card,
            password,
        } => commands::delete_card(data_dir, workspace, list, card, password),
        cli::Command::MoveCard {
            workspace,
            card,
            from,
            to,
            password,
        } => commands::move_card(data_dir, workspace, card, from, to, password),
        cli::Command::ReorderCard {
            workspace,
            list,
            card,
            position,
            password,
        } => commands::reorder_card(data_dir, workspace, list, card, position, password),
        cli::Command::Bin {
            workspace,
            password,
        } => commands::bin(data_dir, workspace, password),
        cli::Command::RestoreList {
            workspace,
            list,
            password,
        } => commands::restore_list(data_dir, workspace, list, password),
        cli::Command::RestoreCard {
            workspace,
            card,
            password,
        } => commands::restore_card(data_dir, workspace, card, password),
        cli::Command::PurgeList {
            workspace,
            list,
            password,
        } => commands::purge_list(data_dir, workspace, list, password),
        cli::Command::PurgeCard {
            workspace,
            card,
            password,
        } => commands::purge_card(data_dir, workspace, card, password),
    }
}
