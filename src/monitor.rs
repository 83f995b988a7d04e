use tokio::{
    select,
    sync::{broadcast, mpsc::UnboundedReceiver},
    time::{interval, Duration, Instant, MissedTickBehavior},
};

use crate::debounce::DebounceSet;
use crate::probe;
use crate::ratesampler::{RateSampler, TotalsCache};
use crate::*;

#[derive(Debug, Clone)]
pub enum MonitorMsg {
    Throughput {
        rx_total: u64,
        tx_total: u64,
        rx_rate: f64,
        tx_rate: f64,
    },
    /// Tracked off-streaks after a switch poll, ascending by id
    OffUpdate(Vec<(Id, u32)>),
    /// Confirmed off long enough to be re-activated
    Ready(Vec<Id>),
    Restored(Id),
    RestoreFailed(Id),
    ProbeFailed(String),
    Paused,
    Resumed,
}

pub struct ThroughputConfig {
    pub rx_command: String,
    pub tx_command: String,
    pub poll_interval: Duration,
    pub min_rate_interval: Duration,
    pub cache_ttl: Duration,
    pub probe_timeout: Duration,
}

pub struct SwitchConfig {
    pub switch_command: String,
    pub restore_command: Option<String>,
    pub poll_interval: Duration,
    pub confirm_checks: u32,
    pub probe_timeout: Duration,
}

/// Polls the rx/tx counter probes on a fixed cadence and feeds the sampler.
/// A failed or timed-out probe skips the tick; the sampler never sees it.
pub async fn throughput_loop(cfg: ThroughputConfig, update_tx: broadcast::Sender<MonitorMsg>) {
    info!("Throughput monitor polling every {:?}", cfg.poll_interval);
    let mut sampler = RateSampler::new(cfg.min_rate_interval);
    let mut cache = TotalsCache::new(cfg.cache_ttl);
    let mut ticker = interval(cfg.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let now = Instant::now();
        let (rx_total, tx_total) = match cache.lookup(now) {
            Some(totals) => totals,
            None => {
                let rx = probe::run_counter_probe(&cfg.rx_command, cfg.probe_timeout).await;
                let tx = probe::run_counter_probe(&cfg.tx_command, cfg.probe_timeout).await;
                match (rx, tx) {
                    (Ok(rx), Ok(tx)) => {
                        cache.store((rx, tx), now);
                        (rx, tx)
                    }
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Counter probe failed: {e}");
                        _ = update_tx.send(MonitorMsg::ProbeFailed(e.to_string()));
                        continue;
                    }
                }
            }
        };
        let (rx_rate, tx_rate) = sampler.sample(rx_total, tx_total, now);
        trace!("totals ({rx_total}, {tx_total}) rates ({rx_rate}, {tx_rate})");
        _ = update_tx.send(MonitorMsg::Throughput {
            rx_total,
            tx_total,
            rx_rate,
            tx_rate,
        });
    }
}

/// Polls the switch report on a fixed cadence, debounces the off-set and
/// announces ids confirmed off. Commands from the control socket are
/// handled between ticks, so the debouncer only ever has one caller.
pub async fn switch_loop(
    cfg: SwitchConfig,
    mut cmd_rx: UnboundedReceiver<MonitorCommand>,
    update_tx: broadcast::Sender<MonitorMsg>,
) {
    info!("Switch monitor polling every {:?}", cfg.poll_interval);
    let mut debounce = DebounceSet::new(cfg.confirm_checks);
    let mut ticker = interval(cfg.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut paused = false;
    loop {
        select! {
            _ = ticker.tick() => {
                if paused { continue; }
                let off = match probe::run_switch_probe(&cfg.switch_command, cfg.probe_timeout).await {
                    Ok(off) => off,
                    Err(e) => {
                        warn!("Switch probe failed: {e}");
                        _ = update_tx.send(MonitorMsg::ProbeFailed(e.to_string()));
                        continue;
                    }
                };
                let ready = debounce.update(off);
                _ = update_tx.send(MonitorMsg::OffUpdate(debounce.contents()));
                if !ready.is_empty() {
                    info!("Confirmed off: {ready:?}");
                    _ = update_tx.send(MonitorMsg::Ready(ready));
                }
            },
            cmd = cmd_rx.recv() => {
                if let Some(cmd) = cmd {
                    debug!("Command received: {cmd:?}");
                    match cmd {
                        MonitorCommand::Ack(id) => debounce.remove(&id),
                        MonitorCommand::Restore(id) => {
                            restore_switch(&cfg, &mut debounce, &id, &update_tx).await;
                        }
                        MonitorCommand::Pause => {
                            paused = true;
                            _ = update_tx.send(MonitorMsg::Paused);
                        }
                        MonitorCommand::Resume => {
                            paused = false;
                            _ = update_tx.send(MonitorMsg::Resumed);
                        }
                    }
                } else {
                    error!("command channel dropped");
                    return;
                }
            },
        }
    }
}

async fn restore_switch(
    cfg: &SwitchConfig,
    debounce: &mut DebounceSet,
    id: &str,
    update_tx: &broadcast::Sender<MonitorMsg>,
) {
    let Some(template) = &cfg.restore_command else {
        warn!("Restore requested for {id} but no restore command configured");
        return;
    };
    match probe::run_restore_probe(template, id, cfg.probe_timeout).await {
        Ok(()) => {
            // streak acknowledged; if it is genuinely still off it will
            // start counting again from 1 on the next poll
            debounce.remove(id);
            info!("Restored {id}");
            _ = update_tx.send(MonitorMsg::Restored(id.to_string()));
        }
        Err(e) => {
            error!("Restore of {id} failed: {e}");
            _ = update_tx.send(MonitorMsg::RestoreFailed(id.to_string()));
        }
    }
}
