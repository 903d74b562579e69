use std::cell::RefCell;

use ftdi_probe::{D2xxDriver, FtStatus, ProbeStep};

/// A driver call as seen by [`RecordingDriver`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    Open { index: i32 },
    SetBitMode { mask: u8, mode: u8 },
    SetLatencyTimer { ms: u8 },
    Close,
}

/// Records every call and fails the ones it is told to.
#[derive(Default)]
pub struct RecordingDriver {
    calls: RefCell<Vec<Call>>,
    failures: Vec<(ProbeStep, FtStatus)>,
}

impl RecordingDriver {
    pub fn failing(step: ProbeStep, status: FtStatus) -> Self {
        Self {
            failures: vec![(step, status)],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, step: ProbeStep, call: Call) -> Result<(), FtStatus> {
        self.calls.borrow_mut().push(call);
        match self.failures.iter().find(|(s, _)| *s == step) {
            Some((_, status)) => Err(*status),
            None => Ok(()),
        }
    }
}

impl D2xxDriver for RecordingDriver {
    type Handle = ();

    fn open(&self, index: i32) -> Result<(), FtStatus> {
        self.record(ProbeStep::Open, Call::Open { index })
    }

    fn set_bit_mode(&self, _: &mut (), mask: u8, mode: u8) -> Result<(), FtStatus> {
        self.record(ProbeStep::SetBitMode, Call::SetBitMode { mask, mode })
    }

    fn set_latency_timer(&self, _: &mut (), ms: u8) -> Result<(), FtStatus> {
        self.record(ProbeStep::SetLatencyTimer, Call::SetLatencyTimer { ms })
    }

    fn close(&self, _: ()) -> Result<(), FtStatus> {
        self.record(ProbeStep::Close, Call::Close)
    }
}
