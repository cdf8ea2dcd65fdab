use crate::item::{HistoryItem, LookupKind};
use crate::manager::HistoryManager;
use crate::query::{QueryView, SortMode};
use ctc_store::Store;

/// Events coming from the front end. Each one runs to completion before the next is
/// dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    RecordLookup { value: String, kind: LookupKind },
    SetFilter(String),
    SetSort(SortMode),
    Clear,
}

/// Owns the history manager and the current view settings; every command returns the
/// freshly projected list ready for rendering.
pub struct HistoryController<S> {
    manager: HistoryManager<S>,
    view: QueryView,
}

impl<S: Store> HistoryController<S> {
    pub fn new(manager: HistoryManager<S>) -> Self {
        Self::with_view(manager, QueryView::default())
    }

    pub fn with_view(manager: HistoryManager<S>, view: QueryView) -> Self {
        Self { manager, view }
    }

    pub fn manager(&self) -> &HistoryManager<S> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut HistoryManager<S> {
        &mut self.manager
    }

    pub fn view(&self) -> &QueryView {
        &self.view
    }

    pub fn dispatch(&mut self, command: HistoryCommand) -> Vec<HistoryItem> {
        let list = match command {
            HistoryCommand::RecordLookup { value, kind } => {
                self.manager.record_lookup(&value, kind)
            }
            HistoryCommand::SetFilter(search) => {
                self.view.set_filter(search);
                self.manager.history()
            }
            HistoryCommand::SetSort(sort) => {
                self.view.set_sort(sort);
                self.manager.history()
            }
            HistoryCommand::Clear => self.manager.clear(),
        };
        self.view.apply(&list)
    }

    pub fn visible(&self) -> Vec<HistoryItem> {
        self.view.apply(&self.manager.history())
    }
}
