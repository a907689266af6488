use std::fmt;

/// identifies a registered alarm
/// only one alarm can be outstanding so everything uses [`ALARM_ID`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(pub u32);

pub const ALARM_ID: AlarmId = AlarmId(1);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// what the trigger handler is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Start,
    Stop,
}

impl Signal {
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::Start => "START_ALARM",
            Self::Stop => "STOP_ALARM",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub kind: Signal,
    pub alarm_id: AlarmId,
}

impl Message {
    #[must_use]
    pub const fn new(kind: Signal, alarm_id: AlarmId) -> Self {
        Self { kind, alarm_id }
    }
}
