use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_PRIORITY: u8 = 5;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("priority {0} is out of range (0-{MAX_PRIORITY})")]
    PriorityOutOfRange(u8),
    #[error("a list named '{0}' already exists on this board")]
    DuplicateList(String),
    #[error("a list named '{0}' is already in the bin")]
    ListAlreadyBinned(String),
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("card not found: {0}")]
    CardNotFound(String),
    #[error("source and destination are both '{0}'")]
    SameList(String),
    #[error("original list '{0}' no longer exists on this board")]
    SourceListMissing(String),
    #[error("board index {0} is out of range")]
    BoardIndexOutOfRange(usize),
    #[error("a workspace must keep at least one board")]
    LastBoard,
}

/// Smallest content unit: a single task with an optional deadline and a
/// 0-5 priority. Identity is structural; two cards are the same card when
/// every field matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub completed: bool,
}

impl Card {
    pub fn new(
        name: &str,
        description: &str,
        deadline: Option<NaiveDate>,
        priority: u8,
    ) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if priority > MAX_PRIORITY {
            return Err(ModelError::PriorityOutOfRange(priority));
        }
        Ok(Card {
            name: name.to_string(),
            description: description.to_string(),
            deadline,
            priority,
            completed: false,
        })
    }

    pub fn rename(&mut self, new_name: &str) -> Result<(), ModelError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        self.name = new_name.to_string();
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    pub fn set_deadline(&mut self, deadline: Option<NaiveDate>) {
        self.deadline = deadline;
    }

    pub fn set_priority(&mut self, priority: u8) -> Result<(), ModelError> {
        if priority > MAX_PRIORITY {
            return Err(ModelError::PriorityOutOfRange(priority));
        }
        self.priority = priority;
        Ok(())
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    /// A card with no deadline is never overdue.
    pub fn is_overdue(&self) -> bool {
        match self.deadline {
            Some(deadline) => deadline < Local::now().date_naive(),
            None => false,
        }
    }
}

/// Ordered column of cards. A list does not know its siblings; name
/// uniqueness across a board is the board's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    cards: Vec<Card>,
}

impl List {
    pub fn new(name: &str, description: &str) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        Ok(List {
            name: name.to_string(),
            description: description.to_string(),
            cards: Vec::new(),
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Appends, preserving insertion order.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Removes the first card equal to `card`. Matching the whole value
    /// rather than the name keeps duplicate-named cards safe.
    pub fn remove_card(&mut self, card: &Card) -> bool {
        self.take_card(card).is_some()
    }

    pub(crate) fn take_card(&mut self, card: &Card) -> Option<Card> {
        let idx = self.cards.iter().position(|c| c == card)?;
        Some(self.cards.remove(idx))
    }

    /// First card with this name, if any.
    pub fn find_card(&self, name: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.name == name)
    }

    pub fn find_card_mut(&mut self, name: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.name == name)
    }

    pub fn rename(&mut self, new_name: &str) -> Result<(), ModelError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        self.name = new_name.to_string();
        Ok(())
    }

    /// Moves a card to `index` within this list (clamped to the end).
    pub fn reorder_card(&mut self, card: &Card, index: usize) -> Result<(), ModelError> {
        let card = self
            .take_card(card)
            .ok_or_else(|| ModelError::CardNotFound(card.name.clone()))?;
        let index = index.min(self.cards.len());
        self.cards.insert(index, card);
        Ok(())
    }
}

/// A card in the bin, tagged with where it came from and when it was
/// deleted. The tag is informational; the source list may be gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedCard {
    pub card: Card,
    pub source_list: String,
    pub deleted_at: DateTime<Utc>,
}

/// Soft-delete holding area. The bin takes ownership of whatever lands in
/// it; the live board tree keeps no reference to archived items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    #[serde(default)]
    lists: Vec<List>,
    #[serde(default)]
    cards: Vec<ArchivedCard>,
}

impl Bin {
    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn cards(&self) -> &[ArchivedCard] {
        &self.cards
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.cards.is_empty()
    }

    pub fn contains_list(&self, name: &str) -> bool {
        self.lists.iter().any(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Archives a list. Archived lists are addressed by name (restore and
    /// purge take a name), so a list whose name is already archived is
    /// refused and handed back to the caller instead of being dropped.
    pub fn archive_list(&mut self, list: List) -> Result<(), List> {
        if self.contains_list(&list.name) {
            return Err(list);
        }
        self.lists.push(list);
        Ok(())
    }

    pub fn archive_card(&mut self, card: Card, source_list: &str, deleted_at: DateTime<Utc>) {
        self.cards.push(ArchivedCard {
            card,
            source_list: source_list.to_string(),
            deleted_at,
        });
    }

    /// Removes and returns an archived list; the caller re-attaches it.
    pub fn restore_list(&mut self, name: &str) -> Option<List> {
        let idx = self
            .lists
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(name))?;
        Some(self.lists.remove(idx))
    }

    /// Source-list tag of the first archived card with this name.
    pub fn card_source(&self, name: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|entry| entry.card.name == name)
            .map(|entry| entry.source_list.as_str())
    }

    pub(crate) fn take_card(&mut self, name: &str) -> Option<ArchivedCard> {
        let idx = self.cards.iter().position(|entry| entry.card.name == name)?;
        Some(self.cards.remove(idx))
    }

    pub fn permanently_delete_list(&mut self, name: &str) -> bool {
        let before = self.lists.len();
        self.lists.retain(|l| !l.name.eq_ignore_ascii_case(name));
        self.lists.len() < before
    }

    /// Drops the first archived card with this name, matching how
    /// `card_source` and restore address archived cards.
    pub fn permanently_delete_card(&mut self, name: &str) -> bool {
        self.take_card(name).is_some()
    }

    /// Drops every archived card tagged with `source_list`; returns how
    /// many were removed.
    pub fn purge_cards_from(&mut self, source_list: &str) -> usize {
        let before = self.cards.len();
        self.cards
            .retain(|entry| !entry.source_list.eq_ignore_ascii_case(source_list));
        before - self.cards.len()
    }
}

/// Ordered collection of lists plus a bin, with an optional "completed"
/// list designation. List names are unique per board, case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    #[serde(default)]
    lists: Vec<List>,
    #[serde(default)]
    bin: Bin,
    #[serde(default)]
    completed_list: Option<String>,
}

impl Board {
    pub fn new(name: &str) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        Ok(Board {
            name: name.to_string(),
            lists: Vec::new(),
            bin: Bin::default(),
            completed_list: None,
        })
    }

    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn bin(&self) -> &Bin {
        &self.bin
    }

    pub fn completed_list(&self) -> Option<&str> {
        self.completed_list.as_deref()
    }

    pub fn total_cards(&self) -> usize {
        self.lists.iter().map(List::card_count).sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.lists
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn get_list(&self, name: &str) -> Option<&List> {
        self.position(name).map(|idx| &self.lists[idx])
    }

    pub fn get_list_mut(&mut self, name: &str) -> Option<&mut List> {
        let idx = self.position(name)?;
        Some(&mut self.lists[idx])
    }

    pub fn rename(&mut self, new_name: &str) -> Result<(), ModelError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        self.name = new_name.to_string();
        Ok(())
    }

    /// Fails without touching the board when a list with that name (any
    /// case) already exists.
    pub fn create_list(&mut self, name: &str, description: &str) -> Result<&mut List, ModelError> {
        let list = List::new(name, description)?;
        if self.position(&list.name).is_some() {
            return Err(ModelError::DuplicateList(list.name));
        }
        self.lists.push(list);
        let idx = self.lists.len() - 1;
        Ok(&mut self.lists[idx])
    }

    pub fn rename_list(&mut self, old: &str, new: &str) -> Result<(), ModelError> {
        let idx = self
            .position(old)
            .ok_or_else(|| ModelError::ListNotFound(old.to_string()))?;
        let new_trimmed = new.trim();
        if new_trimmed.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if let Some(other) = self.position(new_trimmed) {
            if other != idx {
                return Err(ModelError::DuplicateList(new_trimmed.to_string()));
            }
        }
        let old_name = self.lists[idx].name.clone();
        self.lists[idx].rename(new_trimmed)?;
        if let Some(done) = &self.completed_list {
            if done.eq_ignore_ascii_case(&old_name) {
                self.completed_list = Some(new_trimmed.to_string());
            }
        }
        Ok(())
    }

    /// Moves a list (and its cards) into the bin. The completed-list
    /// designation is cleared if it pointed at this list.
    pub fn delete_list(&mut self, name: &str) -> Result<(), ModelError> {
        let idx = self
            .position(name)
            .ok_or_else(|| ModelError::ListNotFound(name.to_string()))?;
        if self.bin.contains_list(&self.lists[idx].name) {
            return Err(ModelError::ListAlreadyBinned(self.lists[idx].name.clone()));
        }
        let list = self.lists.remove(idx);
        if let Some(done) = &self.completed_list {
            if done.eq_ignore_ascii_case(&list.name) {
                self.completed_list = None;
            }
        }
        if let Err(list) = self.bin.archive_list(list) {
            // contains_list was checked above; put the list back rather
            // than lose it if that ever stops holding.
            self.lists.insert(idx, list);
            return Err(ModelError::ListAlreadyBinned(name.to_string()));
        }
        Ok(())
    }

    /// Archives a card into the bin tagged with its list, then removes it
    /// from the live list.
    pub fn delete_card(&mut self, list_name: &str, card: &Card) -> Result<(), ModelError> {
        let idx = self
            .position(list_name)
            .ok_or_else(|| ModelError::ListNotFound(list_name.to_string()))?;
        let source = self.lists[idx].name.clone();
        let card = self.lists[idx]
            .take_card(card)
            .ok_or_else(|| ModelError::CardNotFound(card.name.clone()))?;
        self.bin.archive_card(card, &source, Utc::now());
        Ok(())
    }

    /// Atomic remove-then-insert between two different lists. While a
    /// completed list is designated, the card's completed flag follows
    /// whether the destination is that list.
    pub fn move_card(&mut self, card: &Card, source: &str, dest: &str) -> Result<(), ModelError> {
        if source.eq_ignore_ascii_case(dest) {
            let idx = self
                .position(source)
                .ok_or_else(|| ModelError::ListNotFound(source.to_string()))?;
            return Err(ModelError::SameList(self.lists[idx].name.clone()));
        }
        let src_idx = self
            .position(source)
            .ok_or_else(|| ModelError::ListNotFound(source.to_string()))?;
        let dest_idx = self
            .position(dest)
            .ok_or_else(|| ModelError::ListNotFound(dest.to_string()))?;
        let mut card = self.lists[src_idx]
            .take_card(card)
            .ok_or_else(|| ModelError::CardNotFound(card.name.clone()))?;
        if let Some(done) = &self.completed_list {
            card.completed = done.eq_ignore_ascii_case(&self.lists[dest_idx].name);
        }
        self.lists[dest_idx].add_card(card);
        Ok(())
    }

    /// Moves a list to `index` in the board's ordering (clamped).
    pub fn move_list(&mut self, name: &str, index: usize) -> Result<(), ModelError> {
        let idx = self
            .position(name)
            .ok_or_else(|| ModelError::ListNotFound(name.to_string()))?;
        let list = self.lists.remove(idx);
        let index = index.min(self.lists.len());
        self.lists.insert(index, list);
        Ok(())
    }

    /// Designates (or clears) the completed list. Must name an existing
    /// list to be set.
    pub fn set_completed_list(&mut self, name: Option<&str>) -> Result<(), ModelError> {
        match name {
            None => {
                self.completed_list = None;
                Ok(())
            }
            Some(name) => {
                let idx = self
                    .position(name)
                    .ok_or_else(|| ModelError::ListNotFound(name.to_string()))?;
                self.completed_list = Some(self.lists[idx].name.clone());
                Ok(())
            }
        }
    }

    /// Re-attaches an archived list to the board. Refused when a live list
    /// already carries the name.
    pub fn restore_list(&mut self, name: &str) -> Result<(), ModelError> {
        if !self.bin.contains_list(name) {
            return Err(ModelError::ListNotFound(name.to_string()));
        }
        if self.position(name).is_some() {
            return Err(ModelError::DuplicateList(name.to_string()));
        }
        if let Some(list) = self.bin.restore_list(name) {
            self.lists.push(list);
        }
        Ok(())
    }

    /// Restores an archived card into its originating list. Succeeds only
    /// while that list still exists on the board; otherwise the card stays
    /// in the bin and the caller must purge it explicitly. Returns the
    /// name of the list the card went back to.
    pub fn restore_card(&mut self, name: &str) -> Result<String, ModelError> {
        let source = self
            .bin
            .card_source(name)
            .ok_or_else(|| ModelError::CardNotFound(name.to_string()))?
            .to_string();
        let idx = self
            .position(&source)
            .ok_or_else(|| ModelError::SourceListMissing(source.clone()))?;
        if let Some(entry) = self.bin.take_card(name) {
            self.lists[idx].add_card(entry.card);
        }
        Ok(source)
    }

    /// Permanently deletes an archived list and every archived card tagged
    /// with it. Deleting the list alone would strand those cards: their
    /// restore precondition can never hold again. Returns the number of
    /// cards purged alongside.
    pub fn purge_list(&mut self, name: &str) -> Result<usize, ModelError> {
        if !self.bin.permanently_delete_list(name) {
            return Err(ModelError::ListNotFound(name.to_string()));
        }
        Ok(self.bin.purge_cards_from(name))
    }

    pub fn purge_card(&mut self, name: &str) -> Result<(), ModelError> {
        if !self.bin.permanently_delete_card(name) {
            return Err(ModelError::CardNotFound(name.to_string()));
        }
        Ok(())
    }
}

/// Top-level persisted unit: one or more boards, a selected-board index,
/// and a session-only password. The password never reaches the serialized
/// form; it only decides whether `save` encrypts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    #[serde(default = "Utc::now")]
    last_edited: DateTime<Utc>,
    #[serde(default)]
    boards: Vec<Board>,
    #[serde(default)]
    selected_board: usize,
    #[serde(skip)]
    password: Option<String>,
}

impl Workspace {
    pub fn new(name: &str) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        let board = Board::new(&format!("{name} Board"))?;
        Ok(Workspace {
            name: name.to_string(),
            last_edited: Utc::now(),
            boards: vec![board],
            selected_board: 0,
            password: None,
        })
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn last_edited(&self) -> DateTime<Utc> {
        self.last_edited
    }

    pub fn create_board(&mut self, name: &str) -> Result<&mut Board, ModelError> {
        let board = Board::new(name)?;
        self.boards.push(board);
        let idx = self.boards.len() - 1;
        Ok(&mut self.boards[idx])
    }

    /// A workspace always keeps at least one board.
    pub fn delete_board(&mut self, index: usize) -> Result<(), ModelError> {
        if index >= self.boards.len() {
            return Err(ModelError::BoardIndexOutOfRange(index));
        }
        if self.boards.len() == 1 {
            return Err(ModelError::LastBoard);
        }
        self.boards.remove(index);
        if self.selected_board >= self.boards.len() {
            self.selected_board = self.boards.len() - 1;
        }
        Ok(())
    }

    pub fn board_mut(&mut self, index: usize) -> Result<&mut Board, ModelError> {
        self.boards
            .get_mut(index)
            .ok_or(ModelError::BoardIndexOutOfRange(index))
    }

    pub fn select_board(&mut self, index: usize) -> Result<(), ModelError> {
        if index >= self.boards.len() {
            return Err(ModelError::BoardIndexOutOfRange(index));
        }
        self.selected_board = index;
        Ok(())
    }

    pub fn selected_index(&self) -> usize {
        self.selected_board
    }

    pub fn selected_board(&self) -> &Board {
        &self.boards[self.selected_board]
    }

    pub fn selected_board_mut(&mut self) -> &mut Board {
        &mut self.boards[self.selected_board]
    }

    /// Session-only until the next save. An empty or whitespace password
    /// clears the protection.
    pub fn set_password(&mut self, password: Option<&str>) {
        self.password = password
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Stamped by the manager before every save.
    pub fn update_last_edited(&mut self) {
        self.last_edited = Utc::now();
    }

    /// Repairs invariants after deserialization: at least one board, and a
    /// selected index inside bounds.
    pub(crate) fn normalize(&mut self) {
        if self.boards.is_empty() {
            if let Ok(board) = Board::new(&format!("{} Board", self.name)) {
                self.boards.push(board);
            }
        }
        if self.selected_board >= self.boards.len() {
            self.selected_board = self.boards.len().saturating_sub(1);
        }
    }
}
