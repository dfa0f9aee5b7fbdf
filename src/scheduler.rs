use std::{future::Future, sync::Arc};

use anyhow::{Error, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{config, controller::RefreshController, logging};

/// 定時刷新的排程，結束時呼叫 [`Scheduler::shutdown`]
pub struct Scheduler {
    sched: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        Ok(Scheduler {
            sched: JobScheduler::new().await?,
        })
    }

    /// 啟動時先各執行一次，再依 cron 表示式排程
    pub async fn start(&self, controller: Arc<RefreshController>, app: &config::App) -> Result<()> {
        let feed_ok = match controller.refresh_feed().await {
            Ok(_) => true,
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to refresh the feed at startup because {:?}",
                    why
                ));
                false
            }
        };

        // follow_feed 時成功的刷新已經一併更新過市場數據
        if !(feed_ok && app.market.follow_feed) {
            controller.refresh_market().await;
        }

        //                 sec  min   hour   day of month   month   day of week
        // 例︰"0 * * * * *" 每分鐘
        let feed = Arc::clone(&controller);
        let market = Arc::clone(&controller);
        let jobs = vec![
            // 更新油價資料
            create_job(&app.feed.cron, move || {
                let c = Arc::clone(&feed);
                async move {
                    c.refresh_feed().await?;
                    Ok(())
                }
            })?,
            // 更新匯率與原油價格
            create_job(&app.market.cron, move || {
                let c = Arc::clone(&market);
                async move {
                    c.refresh_market().await;
                    Ok(())
                }
            })?,
        ];

        for job in jobs {
            self.sched.add(job).await?;
        }

        self.sched.start().await?;
        logging::info_file_async(format!(
            "Scheduler started. feed: {} market: {}",
            app.feed.cron, app.market.cron
        ));

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.sched.shutdown().await?;
        logging::info_file_async("Scheduler has been shut down".to_string());
        Ok(())
    }
}

/// 任務失敗只記錄，不會中斷之後的排程
fn create_job<F, Fut>(cron_expr: &str, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    let expr = cron_expr.to_string();
    Ok(Job::new_async(cron_expr, move |_uuid, _l| {
        let task = task.clone();
        let expr = expr.clone();
        Box::pin(async move {
            if let Err(why) = task().await {
                logging::error_file_async(format!(
                    "Failed to execute task({}) because {:?}",
                    expr, why
                ));
            }
        })
    })?)
}
