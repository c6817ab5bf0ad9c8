// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::{
    Client, FilterSelection, FilterUpdate, ImportSource, ImportSummary, Importer, InternalEvent,
    InvestmentId, InvestmentRecord, Notification, NotificationSink, RecordSource,
    RefreshCoordinator, RefreshOutcome, RefreshTimer, SortField, SortSpec, SortState, ViewState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    SetFilter(FilterUpdate),
    ClearFilters,
    SortBy(SortField),
    ClearSort,
    ShowDetails(InvestmentId),
    CloseDetails,
    Delete(InvestmentId),
    Import(ImportSource),
    Refresh,
    SetCompact(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    FilterChanged(FilterSelection),
    SortChanged(Option<SortSpec>),
    DetailsOpened(InvestmentId),
    DetailsClosed,
    DeleteForwarded(InvestmentId),
    DeleteFailed(InvestmentId),
    RefreshStarted { token: u64 },
    RefreshSkipped,
    RefreshFailed,
    RefreshSettled,
    ImportCompleted(ImportSummary),
    ImportFailed,
    CompactChanged(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct DetailSelection {
    record: Option<InvestmentRecord>,
    visible: bool,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<'a> {
    pub visible_rows: Vec<&'a InvestmentRecord>,
    pub view_state: ViewState,
    pub filter: FilterSelection,
    pub sort: Option<SortSpec>,
    pub selected: Option<&'a InvestmentRecord>,
    pub details_visible: bool,
    pub compact: bool,
    pub total_records: usize,
    pub clients: &'a [Client],
}

impl ViewSnapshot<'_> {
    pub fn summary(&self) -> String {
        format!("{} investment(s) found", self.visible_rows.len())
    }
}

pub struct ViewModel<S, I, N, T> {
    source: S,
    importer: I,
    notifier: N,
    refresh: RefreshCoordinator<T>,
    filter: FilterSelection,
    sort: SortState,
    selection: DetailSelection,
    compact: bool,
}

impl<S, I, N, T> ViewModel<S, I, N, T>
where
    S: RecordSource,
    I: Importer,
    N: NotificationSink,
    T: RefreshTimer,
{
    pub fn new(source: S, importer: I, notifier: N, timer: T) -> Self {
        Self::with_coordinator(source, importer, notifier, RefreshCoordinator::new(timer))
    }

    pub fn with_coordinator(
        source: S,
        importer: I,
        notifier: N,
        refresh: RefreshCoordinator<T>,
    ) -> Self {
        Self {
            source,
            importer,
            notifier,
            refresh,
            filter: FilterSelection::default(),
            sort: SortState::default(),
            selection: DetailSelection::default(),
            compact: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn importer(&self) -> &I {
        &self.importer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn refresh(&self) -> &RefreshCoordinator<T> {
        &self.refresh
    }

    pub fn refresh_mut(&mut self) -> &mut RefreshCoordinator<T> {
        &mut self.refresh
    }

    pub fn filter(&self) -> FilterSelection {
        self.filter
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort.spec()
    }

    pub fn is_pending(&self) -> bool {
        self.refresh.is_pending()
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Warm data skips the initial refresh.
    pub fn mount(&mut self) -> Vec<ViewEvent> {
        if !self.source.current_records().is_empty() {
            debug!(
                records = self.source.current_records().len(),
                "records already loaded; skipping initial refresh"
            );
            return Vec::new();
        }
        vec![self.request_refresh()]
    }

    pub fn unmount(&mut self) {
        self.refresh.teardown();
    }

    pub fn handle_internal(&mut self, event: InternalEvent) -> Vec<ViewEvent> {
        if self.refresh.handle_internal(event) {
            vec![ViewEvent::RefreshSettled]
        } else {
            Vec::new()
        }
    }

    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::SetFilter(update) => vec![self.set_filter(update)],
            ViewCommand::ClearFilters => {
                self.filter.clear();
                debug!("filters cleared");
                vec![ViewEvent::FilterChanged(self.filter)]
            }
            ViewCommand::SortBy(field) => vec![self.set_sort(field)],
            ViewCommand::ClearSort => {
                self.sort.clear();
                debug!("sort cleared");
                vec![ViewEvent::SortChanged(None)]
            }
            ViewCommand::ShowDetails(id) => self.show_details(id).into_iter().collect(),
            ViewCommand::CloseDetails => vec![self.close_details()],
            ViewCommand::Delete(id) => vec![self.request_delete(id)],
            ViewCommand::Import(source) => self.request_import(&source),
            ViewCommand::Refresh => vec![self.request_refresh()],
            ViewCommand::SetCompact(compact) => {
                self.compact = compact;
                vec![ViewEvent::CompactChanged(compact)]
            }
        }
    }

    pub fn set_filter(&mut self, update: FilterUpdate) -> ViewEvent {
        self.filter.set(update);
        debug!(dimension = update.dimension().label(), ?update, "filter changed");
        ViewEvent::FilterChanged(self.filter)
    }

    pub fn set_sort(&mut self, field: SortField) -> ViewEvent {
        let spec = self.sort.set_sort(field);
        debug!(
            field = spec.field.as_str(),
            direction = spec.direction.as_str(),
            "sort changed"
        );
        ViewEvent::SortChanged(Some(spec))
    }

    pub fn select_record(&mut self, record: &InvestmentRecord) -> ViewEvent {
        self.selection = DetailSelection {
            record: Some(record.clone()),
            visible: true,
        };
        ViewEvent::DetailsOpened(record.id())
    }

    pub fn show_details(&mut self, id: InvestmentId) -> Option<ViewEvent> {
        let record = self
            .source
            .current_records()
            .iter()
            .find(|record| record.id() == id)?
            .clone();
        Some(self.select_record(&record))
    }

    pub fn close_details(&mut self) -> ViewEvent {
        self.selection = DetailSelection::default();
        ViewEvent::DetailsClosed
    }

    pub fn selected_record(&self) -> Option<&InvestmentRecord> {
        self.selection.record.as_ref()
    }

    pub fn details_visible(&self) -> bool {
        self.selection.visible
    }

    /// Forwards only; the row goes away when the source's collection changes.
    pub fn request_delete(&mut self, id: InvestmentId) -> ViewEvent {
        match self.source.delete_record(id) {
            Ok(()) => {
                info!(%id, "delete forwarded");
                ViewEvent::DeleteForwarded(id)
            }
            Err(error) => {
                let reason = format!("{error:#}");
                warn!(%id, %reason, "delete failed");
                self.notifier.notify(Notification::error(
                    "Could not delete investment",
                    format!("investment {id}: {reason}"),
                ));
                ViewEvent::DeleteFailed(id)
            }
        }
    }

    pub fn request_import(&mut self, source: &ImportSource) -> Vec<ViewEvent> {
        match self.importer.import_records(source) {
            Ok(summary) => {
                info!(
                    source = %source.describe(),
                    imported = summary.imported,
                    clients_created = summary.clients_created,
                    "import completed"
                );
                self.notifier.notify(Notification::info(
                    "Import complete",
                    format!("{} investment(s) imported", summary.imported),
                ));
                vec![ViewEvent::ImportCompleted(summary), self.request_refresh()]
            }
            Err(error) => {
                let reason = format!("{error:#}");
                warn!(source = %source.describe(), %reason, "import failed");
                self.notifier
                    .notify(Notification::error("Import failed", reason));
                vec![ViewEvent::ImportFailed]
            }
        }
    }

    pub fn request_refresh(&mut self) -> ViewEvent {
        match self
            .refresh
            .request_refresh(&mut self.source, &mut self.notifier)
        {
            RefreshOutcome::Started { token } => ViewEvent::RefreshStarted { token },
            RefreshOutcome::AlreadyPending | RefreshOutcome::TornDown => ViewEvent::RefreshSkipped,
            RefreshOutcome::Failed => ViewEvent::RefreshFailed,
        }
    }

    /// Filter then sort, computed from the current collection on every call.
    pub fn visible_rows(&self) -> Vec<&InvestmentRecord> {
        let mut rows: Vec<&InvestmentRecord> = self
            .source
            .current_records()
            .iter()
            .filter(|record| self.filter.matches(record))
            .collect();
        self.sort.apply(&mut rows);
        rows
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::derive(
            self.refresh.is_pending(),
            self.source.current_records().len(),
        )
    }

    pub fn present(&self) -> ViewSnapshot<'_> {
        ViewSnapshot {
            visible_rows: self.visible_rows(),
            view_state: self.view_state(),
            filter: self.filter,
            sort: self.sort.spec(),
            selected: self.selection.record.as_ref(),
            details_visible: self.selection.visible,
            compact: self.compact,
            total_records: self.source.current_records().len(),
            clients: self.source.client_directory(),
        }
    }
}
