//! Inventory screen controller.
//!
//! One controller backs one open view. While open it owns a single live feed
//! and a background task that rebuilds [`InventoryView`] whenever a snapshot
//! arrives or the category filter changes. Mutations go straight to the
//! gateway; their effect reaches the view through the feed.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use stockroom_core::{DocumentId, DomainError};
use stockroom_infra::{DocumentStore, GatewayError, InventoryGateway, RecordFeed, UpdateOutcome};
use stockroom_inventory::{CategoryFilter, InventoryRecord, ItemForm};

use crate::view::InventoryView;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("view channel closed")]
    Closed,
}

struct Session {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// View-model for the inventory list, filter dropdown and statistics.
pub struct InventoryController<S> {
    gateway: Arc<InventoryGateway<S>>,
    low_stock_threshold: u32,
    filter_tx: watch::Sender<CategoryFilter>,
    view_tx: Arc<watch::Sender<InventoryView>>,
    view_rx: watch::Receiver<InventoryView>,
    session: Option<Session>,
}

impl<S> core::fmt::Debug for InventoryController<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryController")
            .field("low_stock_threshold", &self.low_stock_threshold)
            .field("open", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> InventoryController<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(gateway: InventoryGateway<S>, low_stock_threshold: u32) -> Self {
        let (filter_tx, _) = watch::channel(CategoryFilter::All);
        let (view_tx, view_rx) = watch::channel(InventoryView::default());
        Self {
            gateway: Arc::new(gateway),
            low_stock_threshold,
            filter_tx,
            view_tx: Arc::new(view_tx),
            view_rx,
            session: None,
        }
    }

    pub fn gateway(&self) -> &InventoryGateway<S> {
        &self.gateway
    }

    /// Whether the view is still following the collection. Turns `false` once
    /// the live feed ends, even before [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.task.is_finished())
    }

    /// Subscribe to the collection and start keeping the view current.
    ///
    /// Opening an already open controller is a no-op; a session whose feed
    /// ended is reaped and replaced.
    pub async fn open(&mut self) -> Result<(), ControllerError> {
        if self.is_open() {
            return Ok(());
        }
        self.close().await;

        let feed = self.gateway.subscribe().await?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_view_loop(
            feed,
            self.filter_tx.subscribe(),
            self.view_tx.clone(),
            self.low_stock_threshold,
            shutdown_rx,
        ));

        tracing::debug!(collection = self.gateway.collection(), "inventory view opened");
        self.session = Some(Session { shutdown, task });
        Ok(())
    }

    /// Stop following the collection and release the live feed.
    ///
    /// The last computed view stays readable.
    pub async fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let _ = session.shutdown.send(());
        if let Err(err) = session.task.await {
            tracing::error!(error = %err, "inventory view task failed");
        }
        tracing::debug!(collection = self.gateway.collection(), "inventory view closed");
    }

    /// Latest computed view.
    pub fn view(&self) -> InventoryView {
        (*self.view_rx.borrow()).clone()
    }

    /// Receiver notified after every recomputation, for a rendering layer.
    pub fn changes(&self) -> watch::Receiver<InventoryView> {
        self.view_rx.clone()
    }

    /// Wait until the view satisfies `predicate` and return it.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<InventoryView, ControllerError>
    where
        F: FnMut(&InventoryView) -> bool,
    {
        let mut rx = self.view_rx.clone();
        loop {
            {
                let view = rx.borrow_and_update();
                if predicate(&*view) {
                    return Ok((*view).clone());
                }
            }
            rx.changed().await.map_err(|_| ControllerError::Closed)?;
        }
    }

    pub fn selected_category(&self) -> CategoryFilter {
        (*self.filter_tx.borrow()).clone()
    }

    /// Change the dropdown selection; the view is recomputed from the last
    /// snapshot without contacting the store.
    pub fn select_category(&self, filter: CategoryFilter) {
        tracing::debug!(filter = %filter, "category selected");
        self.filter_tx.send_replace(filter);
    }

    /// Validate the form and create a new record stamped with the current time.
    pub async fn add_item(&self, form: &ItemForm) -> Result<DocumentId, ControllerError> {
        let fields = form.parse()?;
        let record = InventoryRecord::draft(fields, Utc::now());
        Ok(self.gateway.create(&record).await?)
    }

    /// Validate the form and overwrite `existing` with it, keeping its id and
    /// creation time.
    pub async fn edit_item(
        &self,
        existing: &InventoryRecord,
        form: &ItemForm,
    ) -> Result<UpdateOutcome, ControllerError> {
        let fields = form.parse()?;
        let record = existing.with_fields(fields);
        Ok(self.gateway.update(&record).await?)
    }

    pub async fn delete_item(&self, id: &DocumentId) -> Result<(), ControllerError> {
        Ok(self.gateway.delete(id).await?)
    }
}

async fn run_view_loop(
    mut feed: RecordFeed,
    mut filter_rx: watch::Receiver<CategoryFilter>,
    view_tx: Arc<watch::Sender<InventoryView>>,
    low_stock_threshold: u32,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut latest = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            snapshot = feed.next() => match snapshot {
                Some(snapshot) => latest = Some(snapshot),
                None => {
                    tracing::warn!("live feed ended");
                    break;
                }
            },
            changed = filter_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if let Some(snapshot) = &latest {
            let filter = (*filter_rx.borrow_and_update()).clone();
            view_tx.send_replace(InventoryView::compute(snapshot, filter, low_stock_threshold));
        }
    }

    feed.cancel();
}
