use crate::monitor::MonitorMsg;
use crate::*;
use askama::Template;
use serde::Serialize;

/// Accumulates monitor messages into the state shown on the status page.
#[derive(Template, Default)]
#[template(path = "sse_update.html")]
pub struct Tracker {
    pub state: String,
    rx_total: u64,
    tx_total: u64,
    rx_rate: f64,
    tx_rate: f64,
    pub rx_rate_h: String,
    pub tx_rate_h: String,
    pub off: Vec<(Id, u32)>,
    pub ready: Vec<Id>,
    pub last_error: String,
}

#[derive(Serialize, Clone, Default)]
pub struct Status {
    pub state: String,
    pub rx_total: u64,
    pub tx_total: u64,
    pub rx_rate: f64,
    pub tx_rate: f64,
    pub off: Vec<(Id, u32)>,
    pub ready: Vec<Id>,
    pub last_error: String,
}

impl Tracker {
    pub fn new() -> Self {
        let mut x = Self::default();
        x.state = "Starting".into();
        x
    }
    pub fn update(&mut self, msg: MonitorMsg) {
        use MonitorMsg::*;
        match msg {
            Throughput {
                rx_total,
                tx_total,
                rx_rate,
                tx_rate,
            } => {
                self.state = "Monitoring".into();
                self.rx_total = rx_total;
                self.tx_total = tx_total;
                self.rx_rate = rx_rate;
                self.tx_rate = tx_rate;
                self.last_error.clear();
                self.calculate();
            }
            OffUpdate(off) => {
                self.off = off;
                // an id no longer tracked went back on (or was acked);
                // stop offering it for restore
                let off = &self.off;
                self.ready.retain(|id| off.iter().any(|(o, _)| o == id));
            }
            Ready(ids) => {
                self.ready = ids;
            }
            Restored(id) => {
                self.ready.retain(|r| *r != id);
                self.off.retain(|(r, _)| *r != id);
            }
            RestoreFailed(id) => {
                self.last_error = format!("restore of {id} failed");
            }
            ProbeFailed(e) => {
                self.state = "Probe failing".into();
                self.last_error = e;
            }
            Paused => {
                self.state = "Paused".into();
            }
            Resumed => {
                self.state = "Monitoring".into();
            }
        }
    }
    /// Evaluates the calculated fields
    fn calculate(&mut self) {
        self.rx_rate_h = humanize_rate(self.rx_rate as u64);
        self.tx_rate_h = humanize_rate(self.tx_rate as u64);
    }
    pub fn snapshot(&self) -> Status {
        Status {
            state: self.state.clone(),
            rx_total: self.rx_total,
            tx_total: self.tx_total,
            rx_rate: self.rx_rate,
            tx_rate: self.tx_rate,
            off: self.off.clone(),
            ready: self.ready.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

fn humanize_rate(r: u64) -> String {
    format!("{}/s", humanize_bytes(r))
}

#[cfg(test)]
mod checks {
    use super::*;

    #[test]
    fn check_throughput_updates_rates() {
        let mut t = Tracker::new();
        t.update(MonitorMsg::Throughput {
            rx_total: 5_000_000_000,
            tx_total: 1_000_000,
            rx_rate: 1500.0,
            tx_rate: 0.0,
        });
        assert_eq!(t.state, "Monitoring");
        assert_eq!(t.rx_rate_h, "1.5 KB/s");
        assert_eq!(t.tx_rate_h, "0.0 B/s");
    }

    #[test]
    fn check_ready_cleared_when_back_on() {
        let mut t = Tracker::new();
        t.update(MonitorMsg::OffUpdate(vec![("sw1".to_string(), 6)]));
        t.update(MonitorMsg::Ready(vec!["sw1".to_string()]));
        // sw1 came back on by itself: the next poll no longer tracks it
        t.update(MonitorMsg::OffUpdate(vec![]));
        assert_eq!(t.ready, Vec::<Id>::new());
    }

    #[test]
    fn check_ready_survives_while_still_off() {
        let mut t = Tracker::new();
        t.update(MonitorMsg::OffUpdate(vec![("sw1".to_string(), 6)]));
        t.update(MonitorMsg::Ready(vec!["sw1".to_string()]));
        t.update(MonitorMsg::OffUpdate(vec![("sw1".to_string(), 7)]));
        assert_eq!(t.ready, vec!["sw1".to_string()]);
    }

    #[test]
    fn check_restored_clears_id() {
        let mut t = Tracker::new();
        t.update(MonitorMsg::OffUpdate(vec![
            ("sw1".to_string(), 6),
            ("sw2".to_string(), 2),
        ]));
        t.update(MonitorMsg::Ready(vec!["sw1".to_string()]));
        t.update(MonitorMsg::Restored("sw1".to_string()));
        assert_eq!(t.ready, Vec::<Id>::new());
        assert_eq!(t.off, vec![("sw2".to_string(), 2)]);
    }
}
