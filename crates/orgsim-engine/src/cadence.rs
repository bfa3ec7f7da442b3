//! Recurring scheduler cadences.
//!
//! Four recurring events run against simulated time: a minute tick, daily
//! maintenance (09:00 local by default), end-of-day (17:00), and hourly
//! background chatter.  They are not queued tasks — the pump computes the
//! next due cadence on the fly and interleaves it with queued work in strict
//! time order (cadences first on ties, in the fixed order below).

use orgsim_core::{SimClock, SimDuration, SimTime, SimulationParameters};

/// The recurring event classes, in their tie-break order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum RecurringKind {
    DailyMaintenance,
    EndOfDay,
    Chatter,
    MinuteTick,
}

const CADENCE_ORDER: [RecurringKind; 4] = [
    RecurringKind::DailyMaintenance,
    RecurringKind::EndOfDay,
    RecurringKind::Chatter,
    RecurringKind::MinuteTick,
];

pub(crate) struct Cadences {
    next_maintenance: SimTime,
    next_end_of_day:  SimTime,
    next_chatter:     SimTime,
    next_tick:        SimTime,
}

impl Cadences {
    pub fn new(clock: &SimClock, params: &SimulationParameters, from: SimTime) -> Self {
        Self {
            next_maintenance: clock.next_daily(from, params.maintenance_hour),
            next_end_of_day:  clock.next_daily(from, params.end_of_day_hour),
            next_chatter:     from + SimDuration::from_hours(1),
            next_tick:        from + SimDuration::from_minutes(1),
        }
    }

    fn due_time(&self, kind: RecurringKind) -> SimTime {
        match kind {
            RecurringKind::DailyMaintenance => self.next_maintenance,
            RecurringKind::EndOfDay => self.next_end_of_day,
            RecurringKind::Chatter => self.next_chatter,
            RecurringKind::MinuteTick => self.next_tick,
        }
    }

    /// The earliest due cadence; ties resolve in `CADENCE_ORDER`.
    pub fn next_due(&self) -> (SimTime, RecurringKind) {
        let mut best = (self.next_maintenance, RecurringKind::DailyMaintenance);
        for kind in CADENCE_ORDER {
            let at = self.due_time(kind);
            if at < best.0 {
                best = (at, kind);
            }
        }
        best
    }

    /// Move `kind`'s cursor to its next occurrence after firing at `fired`.
    pub fn advance(&mut self, kind: RecurringKind, fired: SimTime, clock: &SimClock, params: &SimulationParameters) {
        let just_after = fired + SimDuration(1);
        match kind {
            RecurringKind::DailyMaintenance => {
                self.next_maintenance = clock.next_daily(just_after, params.maintenance_hour);
            }
            RecurringKind::EndOfDay => {
                self.next_end_of_day = clock.next_daily(just_after, params.end_of_day_hour);
            }
            RecurringKind::Chatter => {
                self.next_chatter = fired + SimDuration::from_hours(1);
            }
            RecurringKind::MinuteTick => {
                self.next_tick = fired + SimDuration::from_minutes(1);
            }
        }
    }
}
