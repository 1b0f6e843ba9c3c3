use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::info;

use freshcut_core::calendar::CalendarSource;
use freshcut_discord::channel::ChannelApi;
use freshcut_discord::reminders::ReminderService;

/// Sleep-until-the-hour loop driving the daily reminder tick. Never
/// returns; each tick is one independent unit of work.
pub async fn run_daily<C, S>(service: ReminderService<C, S>, hour_utc: u8)
where
    C: ChannelApi,
    S: CalendarSource,
{
    loop {
        let now = Utc::now();
        let wait = duration_until_hour(now, hour_utc);
        info!(hour_utc, wait_secs = wait.num_seconds(), "reminder tick scheduled");
        tokio::time::sleep(wait.to_std().unwrap_or_default()).await;

        let tick_at = Utc::now();
        info!(event_name = "scheduler.reminder_tick", "running reminder tick");
        service.run_tick(tick_at).await;
    }
}

/// Time until the next occurrence of `hour_utc:00`, strictly in the future
/// so back-to-back ticks cannot fire within the same hour.
fn duration_until_hour(now: DateTime<Utc>, hour_utc: u8) -> Duration {
    let today_tick = now
        .with_hour(u32::from(hour_utc))
        .and_then(|at| at.with_minute(0))
        .and_then(|at| at.with_second(0))
        .and_then(|at| at.with_nanosecond(0))
        .unwrap_or(now);

    let next_tick =
        if today_tick > now { today_tick } else { today_tick + Duration::days(1) };
    next_tick - now
}
