// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::path::PathBuf;

use crate::{Client, InvestmentId, InvestmentRecord, Notification};

/// Read access to the externally owned record collection.
pub trait RecordSource {
    fn current_records(&self) -> &[InvestmentRecord];
    fn client_directory(&self) -> &[Client];
    /// Fire-and-forget; an error means the signal could not be dispatched.
    fn request_repopulate(&mut self) -> Result<()>;
    fn delete_record(&mut self, id: InvestmentId) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Path(PathBuf),
    Inline(String),
}

impl ImportSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Inline(_) => "inline payload".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub clients_created: usize,
}

pub trait Importer {
    fn import_records(&mut self, source: &ImportSource) -> Result<ImportSummary>;
}

pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &mut T {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}
