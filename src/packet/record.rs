use std::fmt::Debug;

use append_only_vec::AppendOnlyVec;

use crate::{
    quantities::{Float, Time, TimeSpan},
    util::average::{IterAverage, NoItems},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Inserted,
    Dropped,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketRecord {
    pub time: Time,
    /// `None` when the buffer never expires packets.
    pub remaining_ttl: Option<TimeSpan>,
    pub kind: RecordKind,
}

/// Buffer history, appended in clock order and scanned backwards.
pub struct RecordLog {
    records: AppendOnlyVec<PacketRecord>,
}

impl Debug for RecordLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLog")
            .field("len", &self.records.len())
            .finish()
    }
}

impl Default for RecordLog {
    fn default() -> Self {
        RecordLog::new()
    }
}

impl RecordLog {
    #[must_use]
    pub fn new() -> RecordLog {
        RecordLog {
            records: AppendOnlyVec::new(),
        }
    }

    pub fn push(&self, record: PacketRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records registered in `[now - window, now]`, newest first.
    pub fn window(
        &self,
        now: Time,
        window: TimeSpan,
    ) -> impl Iterator<Item = &PacketRecord> + '_ {
        let start = now - window;
        (0..self.records.len())
            .rev()
            .map(move |i| &self.records[i])
            .take_while(move |r| r.time >= start)
    }

    /// Net packets gained per second over the window.
    #[must_use]
    pub fn net_growth_rate(&self, now: Time, window: TimeSpan) -> Float {
        if window.seconds() <= 0. {
            return 0.;
        }
        let net: i64 = self
            .window(now, window)
            .map(|r| match r.kind {
                RecordKind::Inserted => 1,
                RecordKind::Dropped | RecordKind::Expired => -1,
            })
            .sum();
        #[allow(clippy::cast_precision_loss)]
        return net as Float / window.seconds();
    }

    /// Mean remaining lifetime of the packets evicted during the window.
    pub fn mean_drop_rttl(&self, now: Time, window: TimeSpan) -> Result<TimeSpan, NoItems> {
        self.window(now, window)
            .filter(|r| r.kind == RecordKind::Dropped)
            .filter_map(|r| r.remaining_ttl)
            .average()
    }

    #[must_use]
    pub fn drops_in(&self, now: Time, window: TimeSpan) -> usize {
        self.window(now, window)
            .filter(|r| r.kind == RecordKind::Dropped)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        quantities::{seconds, Time},
        util::average::NoItems,
    };

    use super::{PacketRecord, RecordKind, RecordLog};

    fn record(time: f64, rttl: f64, kind: RecordKind) -> PacketRecord {
        PacketRecord {
            time: Time::from_sim_start(time),
            remaining_ttl: Some(seconds(rttl)),
            kind,
        }
    }

    fn sample_log() -> RecordLog {
        let log = RecordLog::new();
        log.push(record(0., 100., RecordKind::Inserted));
        log.push(record(10., 100., RecordKind::Inserted));
        log.push(record(20., 40., RecordKind::Dropped));
        log.push(record(30., 100., RecordKind::Inserted));
        log.push(record(40., 0., RecordKind::Expired));
        log.push(record(45., 20., RecordKind::Dropped));
        log
    }

    #[test]
    fn window_scan_stops_at_start() {
        let log = sample_log();
        let now = Time::from_sim_start(45.);
        assert_eq!(log.window(now, seconds(15.)).count(), 3);
        assert_eq!(log.window(now, seconds(100.)).count(), 6);
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn aggregates() {
        let log = sample_log();
        let now = Time::from_sim_start(45.);
        assert!((log.net_growth_rate(now, seconds(40.)) - (-1. / 40.)).abs() < 1e-12);
        assert_eq!(log.mean_drop_rttl(now, seconds(40.)), Ok(seconds(30.)));
        assert_eq!(RecordLog::new().mean_drop_rttl(now, seconds(40.)), Err(NoItems));
        assert_eq!(log.drops_in(now, seconds(40.)), 2);
        assert_eq!(log.drops_in(now, seconds(10.)), 1);
    }
}
