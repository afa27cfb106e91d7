//! Batch admission and bounded-concurrency saga execution.

use std::sync::Arc;

use common::{BatchHandle, HandleGenerator, OrderHandle, OrderStatus, RandomHandleGenerator};
use domain::{Order, RemoteOrderResult};
use futures_util::future::join_all;
use status_store::{OrderRecord, StatusStore, StatusUpdate};

use crate::error::{INTERNAL_ERROR, Result};
use crate::saga::FulfillmentSaga;

/// Reason recorded on orders admitted before a later admission failed.
pub const ADMISSION_FAILED: &str = "ADMISSION_FAILED";

/// Orders persisted as `processing` and ready to run.
#[derive(Debug, Clone)]
pub struct AdmittedBatch {
    pub batch_handle: BatchHandle,
    pub orders: Vec<Order>,
}

impl AdmittedBatch {
    /// Returns the order handles in admission order.
    pub fn order_handles(&self) -> Vec<OrderHandle> {
        self.orders
            .iter()
            .filter_map(|order| order.order_handle.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Terminal outcome of one saga.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub order_handle: OrderHandle,
    pub status: OrderStatus,
    pub failure: Option<String>,
    pub result: Option<RemoteOrderResult>,
}

/// Outcomes of every saga in a batch, in admission order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub batch_handle: BatchHandle,
    pub outcomes: Vec<OrderOutcome>,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.count(OrderStatus::Successful)
    }

    pub fn unsuccessful(&self) -> usize {
        self.count(OrderStatus::Unsuccessful)
    }

    fn count(&self, status: OrderStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Admits batches of orders and runs their sagas in consecutive chunks.
///
/// Chunk *k+1* starts only after every saga of chunk *k* has finished, so
/// at most `concurrency_limit` sagas touch external services at once.
#[derive(Clone)]
pub struct BatchRunner {
    store: Arc<dyn StatusStore>,
    saga: Arc<FulfillmentSaga>,
    handles: Arc<dyn HandleGenerator>,
}

impl BatchRunner {
    /// Creates a runner that allocates random handles.
    pub fn new(store: Arc<dyn StatusStore>, saga: Arc<FulfillmentSaga>) -> Self {
        Self::with_handles(store, saga, Arc::new(RandomHandleGenerator::new()))
    }

    /// Creates a runner with a specific handle generator.
    pub fn with_handles(
        store: Arc<dyn StatusStore>,
        saga: Arc<FulfillmentSaga>,
        handles: Arc<dyn HandleGenerator>,
    ) -> Self {
        Self {
            store,
            saga,
            handles,
        }
    }

    /// Admits a batch and runs it in the background.
    ///
    /// Returns once every order is persisted as `processing`; the sagas
    /// continue on a spawned task.
    pub async fn submit(
        &self,
        orders: Vec<Option<Order>>,
        account_id: &str,
        concurrency_limit: usize,
    ) -> Result<BatchHandle> {
        let batch = self.admit(orders, account_id).await?;
        let batch_handle = batch.batch_handle.clone();

        let runner = self.clone();
        tokio::spawn(async move {
            runner.run(batch, concurrency_limit).await;
        });

        Ok(batch_handle)
    }

    /// Admits a batch and waits for every saga to finish.
    pub async fn submit_and_wait(
        &self,
        orders: Vec<Option<Order>>,
        account_id: &str,
        concurrency_limit: usize,
    ) -> Result<BatchReport> {
        let batch = self.admit(orders, account_id).await?;
        Ok(self.run(batch, concurrency_limit).await)
    }

    /// Stamps and persists every present order as `processing`.
    ///
    /// `None` entries are skipped. If an insert fails, orders admitted so
    /// far are marked unsuccessful and the error is returned.
    #[tracing::instrument(skip(self, orders), fields(orders = orders.len()))]
    pub async fn admit(
        &self,
        orders: Vec<Option<Order>>,
        account_id: &str,
    ) -> Result<AdmittedBatch> {
        let batch_handle = self.handles.batch_handle();
        let mut admitted = Vec::with_capacity(orders.len());

        for mut order in orders.into_iter().flatten() {
            let order_handle = self.handles.order_handle();
            order.admit(account_id, order_handle.clone(), batch_handle.clone());

            let inserted = match OrderRecord::processing(
                order_handle,
                batch_handle.clone(),
                account_id,
                &order,
            ) {
                Ok(record) => self.store.insert(record).await,
                Err(err) => Err(err.into()),
            };

            if let Err(err) = inserted {
                tracing::error!(%batch_handle, error = %err, "batch admission failed");
                self.abandon(admitted).await;
                return Err(err.into());
            }
            admitted.push(order);
        }

        metrics::counter!("checkout_orders_admitted_total").increment(admitted.len() as u64);
        tracing::info!(%batch_handle, admitted = admitted.len(), "batch admitted");

        Ok(AdmittedBatch {
            batch_handle,
            orders: admitted,
        })
    }

    /// Runs every saga of an admitted batch, `concurrency_limit` at a time.
    ///
    /// A limit of zero is treated as one. Saga failures are reported in the
    /// outcome list and never raised.
    #[tracing::instrument(skip(self, batch), fields(batch_handle = %batch.batch_handle))]
    pub async fn run(&self, batch: AdmittedBatch, concurrency_limit: usize) -> BatchReport {
        let limit = concurrency_limit.max(1);
        let batch_start = std::time::Instant::now();
        let mut outcomes = Vec::with_capacity(batch.orders.len());

        let mut pending = batch.orders.into_iter();
        loop {
            let chunk: Vec<Order> = pending.by_ref().take(limit).collect();
            if chunk.is_empty() {
                break;
            }

            let (orders, tasks): (Vec<Order>, Vec<_>) = chunk
                .into_iter()
                .map(|order| {
                    let saga = self.saga.clone();
                    let task_order = order.clone();
                    (order, tokio::spawn(async move { saga.execute(task_order).await }))
                })
                .unzip();

            for (mut order, joined) in orders.into_iter().zip(join_all(tasks).await) {
                let Some(order_handle) = order.order_handle.clone() else {
                    continue;
                };
                let outcome = match joined {
                    Ok(Ok(result)) => OrderOutcome {
                        order_handle,
                        status: OrderStatus::Successful,
                        failure: None,
                        result: Some(result),
                    },
                    Ok(Err(err)) => OrderOutcome {
                        order_handle,
                        status: OrderStatus::Unsuccessful,
                        failure: Some(err.reason()),
                        result: None,
                    },
                    Err(join_err) => {
                        tracing::error!(%order_handle, error = %join_err, "saga task aborted");
                        self.saga.record_failure(&mut order, INTERNAL_ERROR).await;
                        OrderOutcome {
                            order_handle,
                            status: OrderStatus::Unsuccessful,
                            failure: Some(INTERNAL_ERROR.to_string()),
                            result: None,
                        }
                    }
                };
                outcomes.push(outcome);
            }
        }

        let report = BatchReport {
            batch_handle: batch.batch_handle,
            outcomes,
        };

        metrics::histogram!("checkout_batch_duration_seconds")
            .record(batch_start.elapsed().as_secs_f64());
        tracing::info!(
            successful = report.successful(),
            unsuccessful = report.unsuccessful(),
            "batch finished"
        );
        report
    }

    async fn abandon(&self, admitted: Vec<Order>) {
        for mut order in admitted {
            let Some(handle) = order.order_handle.clone() else {
                continue;
            };
            order.mark_unsuccessful(ADMISSION_FAILED);
            let written = match StatusUpdate::unsuccessful(&order, ADMISSION_FAILED) {
                Ok(update) => self.store.update(&handle, update).await.map(|_| ()),
                Err(err) => Err(err.into()),
            };
            if let Err(err) = written {
                tracing::warn!(order_handle = %handle, error = %err, "failed to abandon admitted order");
            }
        }
    }
}
