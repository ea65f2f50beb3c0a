use std::sync::Arc;
use std::time::Duration;

use dispatch_db::models::payment::Payment;
use dispatch_db::PaymentStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const QUEUE_CAPACITY: usize = 10;

/// Periodically pushes every pending payment onto a bounded queue.
pub struct PaymentPoller {
    store: Arc<dyn PaymentStore>,
    period: Duration,
    shutdown: CancellationToken,
}

impl PaymentPoller {
    pub fn new(store: Arc<dyn PaymentStore>, period: Duration, shutdown: CancellationToken) -> Self {
        Self {
            store,
            period,
            shutdown,
        }
    }

    /// Starts the producer. The returned queue closes once the poller stops.
    pub fn spawn(self) -> (JoinHandle<()>, mpsc::Receiver<Payment>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        (tokio::spawn(self.run(tx)), rx)
    }

    async fn run(self, queue: mpsc::Sender<Payment>) {
        info!("Payment poller started (every {:?})", self.period);
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'poll: loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown.cancelled() => break 'poll,
            }

            let payments = match self.store.payments_for_check().await {
                Ok(payments) => payments,
                Err(e) => {
                    error!("Failed to load payments for check: {}", e);
                    continue;
                }
            };

            for payment in payments {
                tokio::select! {
                    sent = queue.send(payment) => {
                        if sent.is_err() {
                            info!("Payment queue consumer is gone");
                            break 'poll;
                        }
                    }
                    _ = self.shutdown.cancelled() => break 'poll,
                }
            }
        }

        info!("Payment poller stopped");
    }
}
