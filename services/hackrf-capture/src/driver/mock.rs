//! Recording driver for unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{NativeDriver, RxCallback, Status, SUCCESS_CODE};

/// One native call as seen by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Setup,
    Exit,
    StartRx,
    StopRx,
    Bandwidth(u32),
    Freq(u64),
    LnaGain(u32),
    VgaGain(u32),
    TxVgaGain(u32),
    SampleRate(u32),
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Exit => "exit",
            Self::StartRx => "start_rx",
            Self::StopRx => "stop_rx",
            Self::Bandwidth(_) => "bandwidth",
            Self::Freq(_) => "freq",
            Self::LnaGain(_) => "lna_gain",
            Self::VgaGain(_) => "vga_gain",
            Self::TxVgaGain(_) => "txvga_gain",
            Self::SampleRate(_) => "sample_rate",
        }
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    codes: HashMap<&'static str, i32>,
    callback: Option<RxCallback>,
    retain_callback: bool,
}

/// Cloneable mock: tests keep one clone and hand another to the device
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call named `op` return `code`
    pub fn set_code(&self, op: &'static str, code: i32) {
        self.state.lock().unwrap().codes.insert(op, code);
    }

    /// Keep invoking the callback after a successful stop, like a driver
    /// with a transfer still in flight
    pub fn retain_callback_after_stop(&self, retain: bool) {
        self.state.lock().unwrap().retain_callback = retain;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.name() == op).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn has_callback(&self) -> bool {
        self.state.lock().unwrap().callback.is_some()
    }

    /// Simulate the driver delivering one raw burst
    pub fn deliver(&self, chunk: &[u8]) {
        let state = self.state.lock().unwrap();
        if let Some(callback) = state.callback.as_ref() {
            callback(chunk);
        }
    }

    fn record(&mut self, call: Call) -> Status {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        let code = state.codes.get(call.name()).copied().unwrap_or(SUCCESS_CODE);
        Status::from_code(code)
    }
}

impl NativeDriver for MockDriver {
    fn setup(&mut self) -> Status {
        self.record(Call::Setup)
    }

    fn exit(&mut self) -> Status {
        self.record(Call::Exit)
    }

    fn start_rx(&mut self, callback: RxCallback) -> Status {
        let status = self.record(Call::StartRx);
        if status.is_success() {
            self.state.lock().unwrap().callback = Some(callback);
        }
        status
    }

    fn stop_rx(&mut self) -> Status {
        let status = self.record(Call::StopRx);
        let mut state = self.state.lock().unwrap();
        if status.is_success() && !state.retain_callback {
            state.callback = None;
        }
        status
    }

    fn set_baseband_filter_bandwidth(&mut self, bandwidth_hz: u32) -> Status {
        self.record(Call::Bandwidth(bandwidth_hz))
    }

    fn set_freq(&mut self, freq_hz: u64) -> Status {
        self.record(Call::Freq(freq_hz))
    }

    fn set_lna_gain(&mut self, gain: u32) -> Status {
        self.record(Call::LnaGain(gain))
    }

    fn set_vga_gain(&mut self, gain: u32) -> Status {
        self.record(Call::VgaGain(gain))
    }

    fn set_txvga_gain(&mut self, gain: u32) -> Status {
        self.record(Call::TxVgaGain(gain))
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Status {
        self.record(Call::SampleRate(sample_rate))
    }
}
