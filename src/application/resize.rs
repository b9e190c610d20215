// Plot-area size observation bound to a guard's lifetime
use crate::application::chart::{ChartController, ChartSurface, PlotSize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Keeps a chart sized to its container until dropped.
pub struct SizeObserver {
    task: JoinHandle<()>,
}

impl SizeObserver {
    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SizeObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Apply every size published on `sizes` to the chart, starting with the current one.
pub fn observe_size<S>(
    chart: Arc<Mutex<ChartController<S>>>,
    mut sizes: watch::Receiver<PlotSize>,
) -> SizeObserver
where
    S: ChartSurface + 'static,
{
    let task = tokio::spawn(async move {
        loop {
            let size = *sizes.borrow_and_update();
            chart.lock().await.resize(size);
            if sizes.changed().await.is_err() {
                tracing::trace!("size source closed");
                break;
            }
        }
    });
    SizeObserver { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart::tests::RecordingSurface;
    use std::time::Duration;

    async fn wait_for_width(chart: &Mutex<ChartController<RecordingSurface>>, width: f64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while chart.lock().await.size().width != width {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("size was not applied");
    }

    #[tokio::test]
    async fn test_sizes_apply_until_guard_dropped() {
        let chart = Arc::new(Mutex::new(ChartController::new(RecordingSurface::default())));
        let (tx, rx) = watch::channel(PlotSize { width: 320.0, height: 200.0 });

        let observer = observe_size(chart.clone(), rx);
        wait_for_width(&chart, 320.0).await;

        tx.send(PlotSize { width: 640.0, height: 200.0 }).unwrap();
        wait_for_width(&chart, 640.0).await;
        assert!(observer.is_active());

        drop(observer);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(PlotSize { width: 1024.0, height: 200.0 });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(chart.lock().await.size().width, 640.0);
    }

    #[tokio::test]
    async fn test_observer_stops_when_source_closes() {
        let chart = Arc::new(Mutex::new(ChartController::new(RecordingSurface::default())));
        let (tx, rx) = watch::channel(PlotSize { width: 100.0, height: 50.0 });
        let observer = observe_size(chart.clone(), rx);
        wait_for_width(&chart, 100.0).await;

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), async {
            while observer.is_active() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}
